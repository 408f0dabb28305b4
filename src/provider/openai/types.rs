use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiChatResponse {
    pub(crate) choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiChoice {
    pub(crate) message: Option<OpenAiMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiMessage {
    #[serde(default)]
    pub(crate) content: Option<OpenAiMessageContent>,
}

/// Content arrives either as one string or as typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OpenAiMessageContent {
    Text(String),
    Parts(Vec<OpenAiMessagePart>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiMessagePart {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiStreamChunk {
    #[serde(default)]
    pub(crate) choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiStreamChoice {
    #[serde(default)]
    pub(crate) delta: Option<OpenAiStreamDelta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiStreamDelta {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

/// Responses-API payload used by the deep-research call shape.
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiResponsesResponse {
    /// Convenience field carrying the final text when the vendor provides it.
    #[serde(default)]
    pub(crate) output_text: Option<String>,
    #[serde(default)]
    pub(crate) output: Vec<OpenAiOutputItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiOutputItem {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) content: Vec<OpenAiOutputPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiOutputPart {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiImageResponse {
    #[serde(default)]
    pub(crate) data: Vec<OpenAiImageDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiImageDatum {
    #[serde(default)]
    pub(crate) b64_json: Option<String>,
}
