use serde::{Deserialize, Serialize};
use std::fmt;

use super::prompt::Prompt;

/// The generation backends a request can be routed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ProviderKind {
    /// Hosted chat-completions service.
    #[default]
    OpenAI,
    /// Locally reachable inference server.
    Ollama,
}

impl ProviderKind {
    /// Wire tag used in requests and in the `model_used` provenance field.
    pub fn tag(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Human-readable name used in error messages and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Ollama => "Ollama",
        }
    }

    /// Parse a provider tag. Anything unrecognized routes to the hosted provider.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ollama" => ProviderKind::Ollama,
            _ => ProviderKind::OpenAI,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<Option<String>> for ProviderKind {
    fn from(tag: Option<String>) -> Self {
        tag.map(|tag| ProviderKind::from_tag(&tag)).unwrap_or_default()
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.tag().to_string()
    }
}

/// Where the processed content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Url,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Text => "text",
            SourceKind::Url => "url",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller's request to process text or a web page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "model_provider", alias = "provider")]
    pub provider: ProviderKind,
    #[serde(default, rename = "model_name", alias = "model")]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ProcessingRequest {
    /// Create a request that processes free text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Create a request that processes the page behind a URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Request handed to a provider adapter.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: Prompt,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            model: None,
            system_prompt: None,
        }
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    /// The requested model, or `default` when none (or an empty one) was given.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.model.as_deref() {
            Some(model) if !model.is_empty() => model,
            _ => default,
        }
    }

    /// System instruction to send: the caller's, else the JSON-structuring default.
    pub fn system_content(&self) -> &str {
        match self.system_prompt.as_deref() {
            Some(system) if !system.is_empty() => system,
            _ => DEFAULT_SYSTEM_PROMPT,
        }
    }
}

/// Completed single-shot output of a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub text: String,
}

/// System instruction used when the caller does not provide one.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a JSON structuring engine.

RULES:
1. Take the input EXACTLY as provided by the user.
2. Do NOT interpret, summarize, rewrite, or add any information.
3. Preserve ALL words, spelling, punctuation, symbols, line breaks, and formatting EXACTLY as they appear.
4. Do NOT infer product names, descriptions, or create extra data not explicitly present in the input.
5. Output ONLY valid JSON. Do NOT include explanations or any text outside the JSON.
6. If unsure, wrap the input exactly as-is into the "raw_input" field.

Your output format must always be:

{
  "structured": {
    // Create keys ONLY for clearly identifiable sections or labels in the input.
    // Use the exact wording from the input for the values.
    // If no structure is identifiable, leave this object empty.
  }
}

- Do NOT rephrase or interpret values when filling fields.
- If there are no fields to extract, leave "structured" as an empty object."#;
