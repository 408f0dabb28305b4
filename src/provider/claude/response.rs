use crate::error::ProviderError;

use super::types::ClaudeMessageResponse;

/// Concatenates the text blocks of a Messages-API response in order.
pub(crate) fn extract_message_text(response: ClaudeMessageResponse) -> Result<String, ProviderError> {
    if response.content.is_empty() {
        return Err(ProviderError::malformed("claude", "response contains no content blocks"));
    }

    let mut buffer = String::new();
    for block in response.content {
        if block.kind == "text" {
            if let Some(text) = block.text {
                buffer.push_str(&text);
            }
        }
    }

    if buffer.is_empty() {
        Err(ProviderError::malformed("claude", "response contains no text blocks"))
    } else {
        Ok(buffer)
    }
}
