use serde::{Deserialize, Serialize};

/// `/api/generate` request body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// A `/api/generate` reply: the whole body when not streaming, or one
/// newline-delimited object when streaming.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    /// Set when the server fails after the stream has started.
    #[serde(default)]
    pub error: Option<String>,
}

/// `/api/tags` reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

/// One installed model as listed by `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// `/api/show` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ShowRequest {
    pub model: String,
}
