//! Chat-completion-style adapter, plus the Responses-API deep-research mode,
//! SSE streaming, and image generation. The only adapter with a streaming path.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::http::{DynHttpTransport, HttpRequest, HttpResponse};
use crate::provider::{DeltaStream, Provider, ProviderId};
use crate::types::AskRequest;

mod deep_research;
mod error;
mod request;
mod response;
mod stream;
mod types;

pub(crate) use deep_research::is_deep_research_model;

use deep_research::{build_deep_research_body, extract_deep_research_text};
use error::parse_openai_error;
use request::build_chat_body;
use response::extract_chat_text;
use stream::{collect_stream_text, create_delta_stream};
use types::{OpenAiChatResponse, OpenAiImageResponse, OpenAiResponsesResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

pub struct OpenAiProvider {
    transport: DynHttpTransport,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(transport: DynHttpTransport, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the API base URL, e.g. for a compatible proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/{path}")
        } else {
            format!("{base}/v1/{path}")
        }
    }

    fn build_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ])
    }

    async fn send_json(&self, path: &str, body: &Value) -> Result<HttpResponse, ProviderError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ProviderError::malformed("openai", format!("failed to serialize request: {err}")))?;
        let mut request = HttpRequest::post_json(self.endpoint(path), payload);
        request.headers = self.build_headers();
        self.transport.send(request).await
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, ProviderError> {
        let status = response.status;
        let text = response.into_string()?;
        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(parse_openai_error(status, &text))
        }
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProviderError> {
        serde_json::from_str(text)
            .map_err(|err| ProviderError::malformed("openai", format!("failed to parse response: {err}")))
    }

    /// Opens a live delta stream for one request. Best-effort single attempt:
    /// no retry and no timeout wrapper apply, failures surface on the stream.
    ///
    /// # Errors
    ///
    /// Returns the vendor rejection or transport fault that prevented the
    /// stream from opening.
    pub async fn stream_ask(&self, request: &AskRequest) -> Result<DeltaStream, ProviderError> {
        let body = build_chat_body(request, true);
        let payload = serde_json::to_vec(&body)
            .map_err(|err| ProviderError::malformed("openai", format!("failed to serialize request: {err}")))?;
        let mut http_request = HttpRequest::post_json(self.endpoint("chat/completions"), payload);
        http_request.headers = self.build_headers();

        let response = self.transport.send_stream(http_request).await?;
        if !(200..300).contains(&response.status) {
            let text = collect_stream_text(response.body).await?;
            return Err(parse_openai_error(response.status, &text));
        }
        Ok(create_delta_stream(response.body))
    }

    /// Generates one image and returns it as a `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns the vendor rejection, a malformed-body error when no image data
    /// comes back, or a transport fault.
    pub async fn draw(&self, prompt: &str, size: Option<&str>) -> Result<String, ProviderError> {
        let body = json!({
            "model": DEFAULT_IMAGE_MODEL,
            "prompt": prompt,
            "size": size.unwrap_or("1024x1024"),
            "n": 1,
        });
        let response = self.send_json("images/generations", &body).await?;
        let text = self.ensure_success(response)?;
        let parsed: OpenAiImageResponse = self.try_parse(&text)?;

        let b64 = parsed
            .data
            .into_iter()
            .next()
            .and_then(|datum| datum.b64_json)
            .ok_or_else(|| ProviderError::malformed("openai", "image response contains no b64 data"))?;
        if BASE64.decode(&b64).is_err() {
            return Err(ProviderError::malformed("openai", "invalid base64 image data"));
        }
        Ok(format!("data:image/png;base64,{b64}"))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn ask(&self, request: &AskRequest) -> Result<String, ProviderError> {
        if is_deep_research_model(&request.model) {
            let body = build_deep_research_body(request);
            let response = self.send_json("responses", &body).await?;
            let text = self.ensure_success(response)?;
            let parsed: OpenAiResponsesResponse = self.try_parse(&text)?;
            return extract_deep_research_text(parsed);
        }

        let body = build_chat_body(request, false);
        let response = self.send_json("chat/completions", &body).await?;
        let text = self.ensure_success(response)?;
        let parsed: OpenAiChatResponse = self.try_parse(&text)?;
        extract_chat_text(parsed)
    }

    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }
}
