//! Message-style adapter for the Anthropic Messages API.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::http::{DynHttpTransport, HttpRequest, HttpResponse};
use crate::provider::{Provider, ProviderId};
use crate::types::AskRequest;

mod error;
mod request;
mod response;
mod types;

use error::parse_claude_error;
use request::build_message_body;
use response::extract_message_text;
use types::ClaudeMessageResponse;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    transport: DynHttpTransport,
    base_url: String,
    api_key: String,
}

impl ClaudeProvider {
    pub fn new(transport: DynHttpTransport, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            ("x-api-key".to_string(), self.api_key.clone()),
            ("anthropic-version".to_string(), API_VERSION.to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ])
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, ProviderError> {
        let status = response.status;
        let text = response.into_string()?;
        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(parse_claude_error(status, &text))
        }
    }
}

#[async_trait]
impl Provider for ClaudeProvider {
    async fn ask(&self, request: &AskRequest) -> Result<String, ProviderError> {
        let body = build_message_body(request);
        let payload = serde_json::to_vec(&body)
            .map_err(|err| ProviderError::malformed("claude", format!("failed to serialize request: {err}")))?;
        let mut http_request = HttpRequest::post_json(self.endpoint(), payload);
        http_request.headers = self.build_headers();

        let response = self.transport.send(http_request).await?;
        let text = self.ensure_success(response)?;
        let parsed: ClaudeMessageResponse = serde_json::from_str(&text)
            .map_err(|err| ProviderError::malformed("claude", format!("failed to parse response: {err}")))?;
        extract_message_text(parsed)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }
}
