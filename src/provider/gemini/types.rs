use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiGenerateResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiCandidate {
    #[serde(default)]
    pub(crate) content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(default)]
    pub(crate) parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiPart {
    #[serde(default)]
    pub(crate) text: Option<String>,
}
