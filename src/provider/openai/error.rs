use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;

/// Maps an OpenAI error body onto the crate taxonomy.
///
/// Every non-2xx becomes a [`ProviderError::Rejected`] carrying the vendor's
/// message and error code; auth failures are not singled out.
pub(crate) fn parse_openai_error(status: u16, body: &str) -> ProviderError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        code: Option<Value>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error {
            let mut message = error.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(code) = error.code {
                message = format!("{message} ({code})");
            }
            return ProviderError::rejected("openai", format!("status {status}: {message}"));
        }
    }
    ProviderError::rejected("openai", format!("status {status}: {body}"))
}
