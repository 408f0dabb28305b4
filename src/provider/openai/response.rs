use crate::error::ProviderError;

use super::types::{OpenAiChatResponse, OpenAiMessageContent};

/// Extracts the assistant text from a Chat Completions response.
///
/// Multi-part content is concatenated in order; a response without any choice
/// or content field is reported as malformed rather than silently empty.
pub(crate) fn extract_chat_text(response: OpenAiChatResponse) -> Result<String, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed("openai", "response contains no choices"))?;

    let content = choice
        .message
        .and_then(|message| message.content)
        .ok_or_else(|| ProviderError::malformed("openai", "choice contains no message content"))?;

    match content {
        OpenAiMessageContent::Text(text) => Ok(text),
        OpenAiMessageContent::Parts(parts) => {
            let mut buffer = String::new();
            for part in parts {
                if part.kind == "text" {
                    if let Some(text) = part.text {
                        buffer.push_str(&text);
                    }
                }
            }
            Ok(buffer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_content_passes_through() {
        let response: OpenAiChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#,
        )
        .expect("parse");
        assert_eq!(extract_chat_text(response).expect("text"), "hi there");
    }

    #[test]
    fn part_list_content_is_concatenated_in_order() {
        let response: OpenAiChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[
                {"type":"text","text":"first "},
                {"type":"text","text":"second"}
            ]}}]}"#,
        )
        .expect("parse");
        assert_eq!(extract_chat_text(response).expect("text"), "first second");
    }

    #[test]
    fn missing_content_is_malformed() {
        let response: OpenAiChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).expect("parse");
        let err = extract_chat_text(response).expect_err("should fail");
        assert!(matches!(err, ProviderError::Malformed { provider: "openai", .. }));
    }

    #[test]
    fn empty_choices_is_malformed() {
        let response: OpenAiChatResponse = serde_json::from_str(r#"{"choices":[]}"#).expect("parse");
        assert!(extract_chat_text(response).is_err());
    }
}
