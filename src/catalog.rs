//! Model discovery and backend health.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::providers::ollama::types::TagEntry;
use crate::{Error, OllamaProvider, ProviderKind};

/// Hosted models advertised when a credential is configured.
const OPENAI_MODELS: &[(&str, u32, &str)] = &[
    ("gpt-3.5-turbo", 4096, "Fast and efficient model for most tasks"),
    ("gpt-4", 8192, "More capable model for complex tasks"),
    ("gpt-4-turbo-preview", 128000, "Latest model with extended context"),
];

/// Short description of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// A model installed on the local inference server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModel {
    pub name: String,
    pub size: Option<u64>,
    pub modified_at: Option<String>,
    /// Family, parameter size, quantization and similar, as reported by the server.
    pub details: Value,
    pub model_info: Value,
    pub capabilities: Vec<String>,
}

impl LocalModel {
    fn basic(tag: TagEntry) -> Self {
        Self {
            name: tag.name,
            size: tag.size,
            modified_at: tag.modified_at,
            details: Value::Object(Map::new()),
            model_info: Value::Object(Map::new()),
            capabilities: Vec::new(),
        }
    }

    fn enrich(&mut self, show: &Value) {
        if let Some(details) = show.get("details") {
            self.details = details.clone();
        }
        if let Some(model_info) = show.get("model_info") {
            self.model_info = model_info.clone();
        }
        if let Some(capabilities) = show.get("capabilities").and_then(Value::as_array) {
            self.capabilities = capabilities
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }
    }
}

/// Models available from each backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelListing {
    pub openai: Vec<ModelSummary>,
    pub ollama: Vec<LocalModel>,
}

/// Result of a single-model lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelDetails {
    /// The server's complete description of the model.
    Full(Value),
    Summary(ModelSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIHealth {
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaHealth {
    pub available: bool,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub openai: OpenAIHealth,
    pub ollama: OllamaHealth,
}

/// Read-only view over the configured backends.
pub struct ModelCatalog<'a> {
    ollama: &'a OllamaProvider,
    openai_configured: bool,
}

impl<'a> ModelCatalog<'a> {
    pub fn new(ollama: &'a OllamaProvider, openai_configured: bool) -> Self {
        Self {
            ollama,
            openai_configured,
        }
    }

    /// List models from both backends.
    ///
    /// Never fails: an unreachable local server contributes no models, and a
    /// model whose details cannot be read is listed with its basic fields.
    pub async fn list_models(&self) -> ModelListing {
        let openai = if self.openai_configured {
            OPENAI_MODELS
                .iter()
                .map(|(name, context_window, description)| ModelSummary {
                    name: name.to_string(),
                    context_window: Some(*context_window),
                    description: description.to_string(),
                    ..ModelSummary::default()
                })
                .collect()
        } else {
            Vec::new()
        };

        let tags = match self.ollama.list_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::debug!(error = %e, "Ollama unavailable, listing no local models");
                return ModelListing {
                    openai,
                    ollama: Vec::new(),
                };
            }
        };

        let mut ollama = Vec::with_capacity(tags.models.len());
        for tag in tags.models {
            let mut model = LocalModel::basic(tag);
            match self.ollama.show(&model.name).await {
                Ok(show) => model.enrich(&show),
                Err(e) => {
                    tracing::error!(model = %model.name, error = %e, "failed to read model details")
                }
            }
            ollama.push(model);
        }

        ModelListing { openai, ollama }
    }

    /// Describe one model.
    ///
    /// Local models are looked up on the server; `detailed` returns its full
    /// description instead of a summary. Hosted models get a static summary.
    pub async fn show_model(
        &self,
        provider: ProviderKind,
        name: &str,
        detailed: bool,
    ) -> Result<ModelDetails, Error> {
        if name.trim().is_empty() {
            return Err(Error::invalid_input("Provider and model name are required"));
        }

        match provider {
            ProviderKind::OpenAI => Ok(ModelDetails::Summary(ModelSummary {
                name: name.to_string(),
                description: format!("OpenAI model: {name}"),
                provider: Some(ProviderKind::OpenAI.tag().to_string()),
                ..ModelSummary::default()
            })),
            ProviderKind::Ollama => {
                let show = self.ollama.show(name).await?;
                if detailed {
                    return Ok(ModelDetails::Full(show));
                }

                Ok(ModelDetails::Summary(ModelSummary {
                    name: show
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or(name)
                        .to_string(),
                    size: show.get("size").and_then(Value::as_u64),
                    modified_at: show
                        .get("modified_at")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    description: format!("Ollama model: {name}"),
                    ..ModelSummary::default()
                }))
            }
        }
    }

    /// Report which backends can currently serve requests.
    pub async fn health(&self) -> HealthReport {
        let available = match self.ollama.list_tags().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Ollama health probe failed");
                false
            }
        };

        HealthReport {
            status: "healthy".to_string(),
            openai: OpenAIHealth {
                configured: self.openai_configured,
            },
            ollama: OllamaHealth {
                available,
                base_url: self.ollama.base_url().to_string(),
            },
        }
    }
}
