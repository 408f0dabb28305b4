use serde_json::{Map, Value, json};

use crate::types::AskRequest;

/// Model families that reject a custom `temperature` and expect the output
/// cap under `max_completion_tokens` instead of `max_tokens`.
const REASONING_FAMILY_PREFIXES: [&str; 4] = ["o1", "o3", "o4", "gpt-5"];

pub(crate) fn is_reasoning_family(model: &str) -> bool {
    REASONING_FAMILY_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Builds a Chat Completions body from a normalized request.
///
/// The transcript maps one-to-one onto OpenAI's role-tagged message list;
/// empty-content turns are dropped so the vendor never sees a blank message.
pub(crate) fn build_chat_body(request: &AskRequest, stream: bool) -> Value {
    let mut messages = Vec::new();

    if let Some(system) = &request.system {
        if !system.is_empty() {
            messages.push(json!({ "role": "system", "content": system }));
        }
    }
    for turn in &request.transcript {
        if turn.content.is_empty() {
            continue;
        }
        let role = match turn.role {
            crate::types::TurnRole::User => "user",
            crate::types::TurnRole::Assistant => "assistant",
            crate::types::TurnRole::System => "system",
        };
        messages.push(json!({ "role": role, "content": turn.content }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(request.model.clone()));
    body.insert("messages".to_string(), Value::Array(messages));

    let reasoning = is_reasoning_family(&request.model);
    if let Some(temperature) = request.temperature {
        if !reasoning {
            body.insert("temperature".to_string(), Value::from(temperature));
        }
    }
    if let Some(max_tokens) = request.max_output_tokens {
        let key = if reasoning {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        body.insert(key.to_string(), Value::from(max_tokens));
    }
    if stream {
        body.insert("stream".to_string(), Value::Bool(true));
    }

    Value::Object(body)
}
