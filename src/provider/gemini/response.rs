use crate::error::ProviderError;

use super::types::GeminiGenerateResponse;

/// Concatenates the text parts of the first candidate in order.
pub(crate) fn extract_candidate_text(response: GeminiGenerateResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed("gemini", "response contains no candidates"))?;

    let content = candidate
        .content
        .ok_or_else(|| ProviderError::malformed("gemini", "candidate contains no content"))?;

    let mut buffer = String::new();
    for part in content.parts {
        if let Some(text) = part.text {
            buffer.push_str(&text);
        }
    }

    if buffer.is_empty() {
        Err(ProviderError::malformed("gemini", "candidate contains no text parts"))
    } else {
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_parts_of_first_candidate() {
        let response: GeminiGenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"one "},{"text":"two"}]}}]}"#,
        )
        .expect("parse");
        assert_eq!(extract_candidate_text(response).expect("text"), "one two");
    }

    #[test]
    fn no_candidates_is_malformed() {
        let response: GeminiGenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).expect("parse");
        let err = extract_candidate_text(response).expect_err("should fail");
        assert!(matches!(err, ProviderError::Malformed { provider: "gemini", .. }));
    }
}
