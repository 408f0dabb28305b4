//! Shared data structures for normalized requests and aggregated outcomes.
//!
//! These types isolate the rest of the crate from vendor payload shapes: the
//! orchestrator only ever sees an [`AskRequest`] going out and a
//! [`ProviderOutcome`] coming back, whichever vendor sits behind the adapter.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies one of the supported vendors.
///
/// Serialized lowercase so it doubles as the JSON key of the aggregate result
/// and as the `provider` field of SSE events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Claude,
    Gemini,
}

impl ProviderId {
    /// All providers, in the fixed order requests are fanned out.
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Claude, ProviderId::Gemini];

    /// Lowercase wire name, matching the JSON serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of one prior conversational exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl TurnRole {
    /// Capitalized label used when a transcript is flattened into plain text
    /// for the deep-research call shape.
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
            TurnRole::System => "System",
        }
    }
}

/// One prior exchange attached to a new request for context.
///
/// Turns with empty content are legal here; each adapter drops them before
/// building its wire payload so no vendor ever receives an empty message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user<T: Into<String>>(content: T) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// The unit of work submitted to one provider adapter.
///
/// By the time an `AskRequest` exists the prompt is guaranteed non-empty and
/// attachments have already been inlined; absence of a prompt is rejected
/// upstream by the HTTP handler or the CLI.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chorus::types::AskRequest;
///
/// let request = AskRequest {
///     prompt: "What is ownership?".to_string(),
///     system: Some("Answer in one paragraph.".to_string()),
///     transcript: Vec::new(),
///     model: "gpt-4o-mini".to_string(),
///     temperature: Some(0.3),
///     max_output_tokens: Some(512),
///     deadline: Duration::from_millis(5000),
/// };
/// assert!(!request.prompt.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct AskRequest {
    /// Final prompt text, attachments already inlined.
    pub prompt: String,
    /// Optional system instruction.
    pub system: Option<String>,
    /// Prior turns, oldest first.
    pub transcript: Vec<Turn>,
    /// Vendor model identifier.
    pub model: String,
    /// Sampling temperature; adapters drop it for model families that reject it.
    pub temperature: Option<f32>,
    /// Output length cap; adapters rename the field per vendor.
    pub max_output_tokens: Option<u32>,
    /// Per-attempt deadline enforced by the timeout wrapper.
    pub deadline: Duration,
}

/// Uniform result of one provider's participation in a dispatch.
///
/// Exactly one of `text` and `error` is populated, mirrored by `ok`. Created
/// once per requested provider per dispatch and immutable after the join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutcome {
    pub provider: ProviderId,
    pub model: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl ProviderOutcome {
    /// Successful outcome carrying the normalized response text.
    pub fn success(provider: ProviderId, model: String, text: String, latency_ms: u64) -> Self {
        Self {
            provider,
            model,
            ok: true,
            text: Some(text),
            error: None,
            latency_ms,
        }
    }

    /// Failed outcome carrying a human-readable error message.
    pub fn failure(provider: ProviderId, model: String, error: String, latency_ms: u64) -> Self {
        Self {
            provider,
            model,
            ok: false,
            text: None,
            error: Some(error),
            latency_ms,
        }
    }
}

/// Per-provider outcomes for one top-level request.
///
/// Only requested providers appear as keys; a provider the caller did not ask
/// for is simply absent, never a null placeholder.
pub type AggregateResult = BTreeMap<ProviderId, ProviderOutcome>;

/// Small file attachment inlined into the prompt text before fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

/// Per-attachment cap applied during inlining.
pub const ATTACHMENT_CHAR_LIMIT: usize = 100_000;

/// Marker appended in place of content cut by [`ATTACHMENT_CHAR_LIMIT`].
pub const ATTACHMENT_TRUNCATION_MARKER: &str = "\n[... attachment truncated ...]";

/// Inlines attachments into the prompt so every provider sees identical text.
///
/// Runs once per dispatch, before any per-provider request is built. Each
/// attachment is capped at [`ATTACHMENT_CHAR_LIMIT`] characters with a
/// truncation marker; the cap counts characters, not bytes, so multi-byte
/// content is never split mid-codepoint.
pub fn inline_attachments(prompt: &str, attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return prompt.to_string();
    }

    let mut augmented = String::new();
    for attachment in attachments {
        augmented.push_str(&format!("--- attachment: {} ---\n", attachment.name));
        if attachment.content.chars().count() > ATTACHMENT_CHAR_LIMIT {
            augmented.extend(attachment.content.chars().take(ATTACHMENT_CHAR_LIMIT));
            augmented.push_str(ATTACHMENT_TRUNCATION_MARKER);
        } else {
            augmented.push_str(&attachment.content);
        }
        augmented.push_str("\n\n");
    }
    augmented.push_str(prompt);
    augmented
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderId::OpenAi).expect("serialize");
        assert_eq!(json, "\"openai\"");
        let json = serde_json::to_string(&ProviderId::Claude).expect("serialize");
        assert_eq!(json, "\"claude\"");
    }

    #[test]
    fn outcome_serializes_camel_case_and_skips_absent_fields() {
        let outcome =
            ProviderOutcome::success(ProviderId::Gemini, "gemini-2.0-flash".to_string(), "hi".to_string(), 42);
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["latencyMs"], 42);
        assert_eq!(value["text"], "hi");
        assert!(value.get("error").is_none(), "error key should be absent: {value}");
    }

    #[test]
    fn inline_attachments_without_attachments_is_identity() {
        assert_eq!(inline_attachments("hello", &[]), "hello");
    }

    #[test]
    fn inline_attachments_caps_oversized_content() {
        let attachment = Attachment {
            name: "big.log".to_string(),
            content: "x".repeat(150_000),
        };
        let augmented = inline_attachments("summarize this", &[attachment]);

        assert!(augmented.contains(&"x".repeat(ATTACHMENT_CHAR_LIMIT)));
        assert!(!augmented.contains(&"x".repeat(ATTACHMENT_CHAR_LIMIT + 1)));
        assert!(augmented.contains(ATTACHMENT_TRUNCATION_MARKER));
        assert!(augmented.ends_with("summarize this"));
    }

    #[test]
    fn inline_attachments_keeps_small_content_whole() {
        let attachment = Attachment {
            name: "note.txt".to_string(),
            content: "short".to_string(),
        };
        let augmented = inline_attachments("prompt", &[attachment]);
        assert!(augmented.contains("--- attachment: note.txt ---"));
        assert!(augmented.contains("short"));
        assert!(!augmented.contains(ATTACHMENT_TRUNCATION_MARKER));
    }
}
