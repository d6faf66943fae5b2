use bytes::Bytes;
use futures_util::{stream, StreamExt, TryStreamExt};
use reqwest::Client;
use std::time::Duration;

use super::types::{GenerateOptions, GenerateRequest, GenerateResponse, ShowRequest, TagsResponse};
use crate::ndjson_stream::LineStreamExt;
use crate::provider::{ProviderStream, TextProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::{
    Error, GatewayConfig, GenerationRequest, ProviderEvent, ProviderKind, ProviderResult,
    DEFAULT_OLLAMA_BASE_URL,
};

const PROVIDER: &str = "Ollama";

/// Model used when the request names none.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";

/// Local inference server speaking the Ollama HTTP API.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    /// Create a provider against the default local address.
    pub fn new() -> Result<Self, Error> {
        Self::new_with_base_url(DEFAULT_OLLAMA_BASE_URL.to_string(), Duration::from_secs(120))
    }

    /// Create a provider with custom base URL and per-call timeout.
    pub fn new_with_base_url(base_url: String, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build Ollama client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error> {
        Self::new_with_base_url(config.ollama_base_url.clone(), config.local_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// This backend has no system-role field, so the system instruction is
    /// prepended to the prompt.
    fn convert_request(&self, request: &GenerationRequest, stream: bool) -> GenerateRequest {
        GenerateRequest {
            model: request.model_or(DEFAULT_OLLAMA_MODEL).to_string(),
            prompt: format!("{}\n\n{}", request.system_content(), request.prompt),
            stream,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_OUTPUT_TOKENS,
            },
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert one NDJSON line into adapter events.
    ///
    /// Lines that do not decode are skipped: one bad line should not end an
    /// otherwise healthy stream.
    fn convert_line(line: Bytes) -> Vec<Result<ProviderEvent, Error>> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return vec![];
        }

        let chunk = match serde_json::from_slice::<GenerateResponse>(&line) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable Ollama stream line");
                return vec![];
            }
        };

        if let Some(message) = chunk.error {
            return vec![Err(Error::upstream(PROVIDER, message))];
        }

        let mut events = Vec::with_capacity(2);
        if let Some(text) = chunk.response.filter(|t| !t.is_empty()) {
            events.push(Ok(ProviderEvent::Delta(text)));
        }
        if chunk.done {
            events.push(Ok(ProviderEvent::Completed));
        }
        events
    }

    /// List installed models via `/api/tags`.
    pub async fn list_tags(&self) -> Result<TagsResponse, Error> {
        let response = self
            .client
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .map_err(|e| Error::transport(PROVIDER, &self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(PROVIDER, status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::upstream(PROVIDER, format!("failed to parse model list: {e}")))
    }

    /// Fetch the raw `/api/show` document for a model.
    pub async fn show(&self, model: &str) -> Result<serde_json::Value, Error> {
        tracing::info!(model, "requesting Ollama model details");

        let response = self
            .client
            .post(self.endpoint("/api/show"))
            .json(&ShowRequest {
                model: model.to_string(),
            })
            .send()
            .await
            .map_err(|e| Error::transport(PROVIDER, &self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(model, %status, "Ollama model details failed");
            return Err(Error::from_status(PROVIDER, status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::upstream(PROVIDER, format!("failed to parse model details: {e}")))
    }
}

#[async_trait::async_trait]
impl TextProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_OLLAMA_MODEL
    }

    async fn call_once(&self, request: &GenerationRequest) -> Result<ProviderResult, Error> {
        let body = self.convert_request(request, false);

        tracing::info!(
            model = %body.model,
            prompt_chars = request.prompt.char_len(),
            "Ollama generate request"
        );

        let response = self
            .client
            .post(self.endpoint("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(model = %body.model, error = %e, "Ollama connection error");
                Error::transport(PROVIDER, &self.base_url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(model = %body.model, %status, "Ollama generate failed");
            return Err(Error::from_status(PROVIDER, status.as_u16(), &error_text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(PROVIDER, format!("failed to parse response: {e}")))?;

        if let Some(message) = generated.error {
            return Err(Error::upstream(PROVIDER, message));
        }

        let text = generated.response.unwrap_or_default().trim().to_string();
        tracing::debug!(model = %body.model, response_chars = text.chars().count(), "Ollama generate done");

        Ok(ProviderResult { text })
    }

    fn call_streaming(&self, request: &GenerationRequest) -> ProviderStream {
        let body = self.convert_request(request, true);
        tracing::info!(
            model = %body.model,
            prompt_chars = request.prompt.char_len(),
            "Ollama stream request"
        );

        let pending = self
            .client
            .post(self.endpoint("/api/generate"))
            .json(&body)
            .send();
        let base_url = self.base_url.clone();

        let opened = async move {
            let response = pending.await.map_err(|e| {
                tracing::error!(error = %e, "Ollama connection error");
                Error::transport(PROVIDER, &base_url, e)
            })?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!(%status, "Ollama stream request failed");
                return Err(Error::from_status(PROVIDER, status.as_u16(), &error_text));
            }

            let events = response
                .bytes_stream()
                .lines_from(PROVIDER)
                .map(|line_result| match line_result {
                    Ok(line) => Self::convert_line(line),
                    Err(e) => vec![Err(e)],
                })
                .flat_map(stream::iter)
                // Only `done: true` completes the stream; running out of body first is a failure
                .chain(stream::once(async {
                    Err(Error::upstream(
                        PROVIDER,
                        "stream ended before the model reported completion",
                    ))
                }));

            Ok::<ProviderStream, Error>(Box::pin(events))
        };

        Box::pin(stream::once(opened).try_flatten())
    }
}
