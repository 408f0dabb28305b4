use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ClaudeMessageResponse {
    #[serde(default)]
    pub(crate) content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaudeContentBlock {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) text: Option<String>,
}
