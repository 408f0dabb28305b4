use serde::Deserialize;

use crate::error::ProviderError;

/// Maps an Anthropic error body onto the crate taxonomy.
pub(crate) fn parse_claude_error(status: u16, body: &str) -> ProviderError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        #[serde(rename = "type")]
        kind: Option<String>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error {
            let message = error.message.unwrap_or_else(|| "unknown error".to_string());
            let message = match error.kind {
                Some(kind) => format!("{message} ({kind})"),
                None => message,
            };
            return ProviderError::rejected("claude", format!("status {status}: {message}"));
        }
    }
    ProviderError::rejected("claude", format!("status {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_typed_message() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = parse_claude_error(401, body);
        let text = err.to_string();
        assert!(text.contains("invalid x-api-key"), "unexpected: {text}");
        assert!(text.contains("authentication_error"), "unexpected: {text}");
    }
}
