//! Generative-content-style adapter for the Google Gemini API.
//!
//! The model name travels in the URL path and the API key in a query
//! parameter, unlike the header-credentialed adapters.

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

use error::parse_gemini_error;
use request::build_generate_body;
use response::extract_candidate_text;
use types::GeminiGenerateResponse;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    transport: DynHttpTransport,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
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

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        )
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, ProviderError> {
        let status = response.status;
        let text = response.into_string()?;
        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(parse_gemini_error(status, &text))
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn ask(&self, request: &AskRequest) -> Result<String, ProviderError> {
        let body = build_generate_body(request);
        let payload = serde_json::to_vec(&body)
            .map_err(|err| ProviderError::malformed("gemini", format!("failed to serialize request: {err}")))?;
        let mut http_request = HttpRequest::post_json(self.endpoint(&request.model), payload);
        http_request
            .headers
            .extend(HashMap::from([("Accept".to_string(), "application/json".to_string())]));

        let response = self.transport.send(http_request).await?;
        let text = self.ensure_success(response)?;
        let parsed: GeminiGenerateResponse = serde_json::from_str(&text)
            .map_err(|err| ProviderError::malformed("gemini", format!("failed to parse response: {err}")))?;
        extract_candidate_text(parsed)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }
}
