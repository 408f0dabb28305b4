use serde_json::{Map, Value, json};

use crate::types::{AskRequest, TurnRole};

/// Anthropic requires `max_tokens`; applied when the caller set no cap.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Builds a Messages-API body from a normalized request.
///
/// System turns cannot appear in the `messages` list, so the optional system
/// instruction and any system-role transcript turns are folded into the
/// top-level `system` field. Empty-content turns are dropped.
pub(crate) fn build_message_body(request: &AskRequest) -> Value {
    let mut system_texts = Vec::new();
    if let Some(system) = &request.system {
        if !system.is_empty() {
            system_texts.push(system.clone());
        }
    }

    let mut messages = Vec::new();
    for turn in &request.transcript {
        if turn.content.is_empty() {
            continue;
        }
        match turn.role {
            TurnRole::System => system_texts.push(turn.content.clone()),
            TurnRole::User => messages.push(json!({ "role": "user", "content": turn.content })),
            TurnRole::Assistant => {
                messages.push(json!({ "role": "assistant", "content": turn.content }))
            }
        }
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(request.model.clone()));
    body.insert("messages".to_string(), Value::Array(messages));
    body.insert(
        "max_tokens".to_string(),
        Value::from(request.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
    );
    if !system_texts.is_empty() {
        body.insert("system".to_string(), Value::String(system_texts.join("\n\n")));
    }
    if let Some(temperature) = request.temperature {
        body.insert("temperature".to_string(), Value::from(temperature));
    }

    Value::Object(body)
}
