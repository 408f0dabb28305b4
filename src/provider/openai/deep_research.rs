//! Long-running tool-augmented mode for deep-research models.
//!
//! These models go through the Responses API with a fundamentally different
//! call shape: one flattened input string plus a fixed declaration of the tool
//! capabilities the planner may use. Sampling parameters have no meaningful
//! mapping here and are ignored.

use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::types::AskRequest;

use super::types::OpenAiResponsesResponse;

/// Fixed planner preamble prepended to every deep-research input.
const PLANNER_INSTRUCTIONS: &str = "You are a meticulous research assistant. \
Plan the investigation before answering: break the task into steps, search the \
web for current primary sources, run code when a computation or comparison \
would strengthen the answer, and cite what you found. Finish with a clear, \
well-structured final report.";

/// True when the model identifier selects the deep-research call shape.
pub(crate) fn is_deep_research_model(model: &str) -> bool {
    model.contains("deep-research")
}

/// Builds the Responses-API body for a deep-research request.
///
/// The input is a single flattened string: planner block, optional system
/// instruction, each transcript turn rendered as `"Role: content"`, and the
/// final prompt, joined with blank lines. Empty turns are dropped.
pub(crate) fn build_deep_research_body(request: &AskRequest) -> Value {
    let mut sections = vec![PLANNER_INSTRUCTIONS.to_string()];

    if let Some(system) = &request.system {
        if !system.is_empty() {
            sections.push(system.clone());
        }
    }
    for turn in &request.transcript {
        if turn.content.is_empty() {
            continue;
        }
        sections.push(format!("{}: {}", turn.role.label(), turn.content));
    }
    sections.push(request.prompt.clone());

    json!({
        "model": request.model,
        "input": sections.join("\n\n"),
        "tools": [
            { "type": "web_search_preview" },
            { "type": "code_interpreter", "container": { "type": "auto" } }
        ]
    })
}

/// Extracts the final report text from a Responses-API payload.
///
/// Prefers the `output_text` convenience field; when absent, concatenates the
/// `output_text` fragments of every message item in the output list.
pub(crate) fn extract_deep_research_text(
    response: OpenAiResponsesResponse,
) -> Result<String, ProviderError> {
    if let Some(text) = response.output_text {
        if !text.is_empty() {
            return Ok(text);
        }
    }

    let mut buffer = String::new();
    for item in response.output {
        if item.kind != "message" {
            continue;
        }
        for part in item.content {
            if part.kind == "output_text" {
                if let Some(text) = part.text {
                    buffer.push_str(&text);
                }
            }
        }
    }

    if buffer.is_empty() {
        Err(ProviderError::malformed(
            "openai",
            "deep-research response contains no output text",
        ))
    } else {
        Ok(buffer)
    }
}
