use serde_json::{Map, Value, json};

use crate::types::{AskRequest, TurnRole};

/// Builds a GenerateContent body from a normalized request.
///
/// Gemini names the assistant role `model` and carries system text in a
/// dedicated `systemInstruction` field; system-role transcript turns are
/// folded in there alongside the request-level instruction. The model itself
/// travels in the URL path, not the body. Empty-content turns are dropped.
pub(crate) fn build_generate_body(request: &AskRequest) -> Value {
    let mut system_texts = Vec::new();
    if let Some(system) = &request.system {
        if !system.is_empty() {
            system_texts.push(system.clone());
        }
    }

    let mut contents = Vec::new();
    for turn in &request.transcript {
        if turn.content.is_empty() {
            continue;
        }
        match turn.role {
            TurnRole::System => system_texts.push(turn.content.clone()),
            TurnRole::User => contents.push(json!({
                "role": "user",
                "parts": [{ "text": turn.content }]
            })),
            TurnRole::Assistant => contents.push(json!({
                "role": "model",
                "parts": [{ "text": turn.content }]
            })),
        }
    }
    contents.push(json!({
        "role": "user",
        "parts": [{ "text": request.prompt }]
    }));

    let mut body = Map::new();
    body.insert("contents".to_string(), Value::Array(contents));

    if !system_texts.is_empty() {
        body.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": system_texts.join("\n\n") }] }),
        );
    }

    let mut generation_config = Map::new();
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(max_tokens) = request.max_output_tokens {
        generation_config.insert("maxOutputTokens".to_string(), Value::from(max_tokens));
    }
    if !generation_config.is_empty() {
        body.insert("generationConfig".to_string(), Value::Object(generation_config));
    }

    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::Turn;

    fn request() -> AskRequest {
        AskRequest {
            prompt: "hello".to_string(),
            system: Some("be brief".to_string()),
            transcript: vec![Turn::user("hi"), Turn::assistant("hey"), Turn::user("")],
            model: "gemini-2.0-flash".to_string(),
            temperature: Some(0.4),
            max_output_tokens: Some(128),
            deadline: Duration::from_millis(5000),
        }
    }

    #[test]
    fn assistant_role_maps_to_model() {
        let body = build_generate_body(&request());
        let contents = body["contents"].as_array().expect("contents");
        assert_eq!(contents[1]["role"], "model");
    }

    #[test]
    fn system_text_lands_in_system_instruction() {
        let body = build_generate_body(&request());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        let contents = body["contents"].as_array().expect("contents");
        assert!(contents.iter().all(|c| c["role"] != "system"));
    }

    #[test]
    fn sampling_lands_in_generation_config() {
        let body = build_generate_body(&request());
        assert_eq!(body["generationConfig"]["temperature"], 0.4);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 128);
    }

    #[test]
    fn empty_turns_are_dropped() {
        let body = build_generate_body(&request());
        let contents = body["contents"].as_array().expect("contents");
        // two transcript turns + prompt, the empty one gone
        assert_eq!(contents.len(), 3);
    }

    #[test]
    fn generation_config_absent_when_no_sampling_set() {
        let mut req = request();
        req.temperature = None;
        req.max_output_tokens = None;
        let body = build_generate_body(&req);
        assert!(body.get("generationConfig").is_none());
    }
}
