use serde::Deserialize;

use crate::error::ProviderError;

/// Maps a Google API error body onto the crate taxonomy.
pub(crate) fn parse_gemini_error(status: u16, body: &str) -> ProviderError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        status: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error {
            let message = error.message.unwrap_or_else(|| "unknown error".to_string());
            let message = match error.status {
                Some(status_name) => format!("{message} ({status_name})"),
                None => message,
            };
            return ProviderError::rejected("gemini", format!("status {status}: {message}"));
        }
    }
    ProviderError::rejected("gemini", format!("status {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_google_style_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let err = parse_gemini_error(400, body);
        let text = err.to_string();
        assert!(text.contains("API key not valid"), "unexpected: {text}");
        assert!(text.contains("INVALID_ARGUMENT"), "unexpected: {text}");
    }
}
