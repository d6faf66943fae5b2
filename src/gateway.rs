use std::time::Instant;
use tracing::Instrument;

use crate::catalog::ModelCatalog;
use crate::content::ContentResolver;
use crate::provider::TextProvider;
use crate::response::{EventStream, ResponseEnvelope, StreamTrailer};
use crate::{
    Error, GatewayConfig, GenerationRequest, OllamaProvider, OpenAIProvider, ProcessingRequest,
    Prompt, ProviderKind,
};

/// Entry point tying content resolution, prompt building, provider dispatch
/// and response normalization together.
///
/// `Gateway` holds no per-request state and can be shared across tasks
/// behind an `Arc`.
pub struct Gateway {
    resolver: ContentResolver,
    openai: OpenAIProvider,
    ollama: OllamaProvider,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self, Error> {
        Ok(Self {
            resolver: ContentResolver::from_config(&config)?,
            openai: OpenAIProvider::from_config(&config)?,
            ollama: OllamaProvider::from_config(&config)?,
            config,
        })
    }

    /// Create a gateway configured from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(GatewayConfig::from_env())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The adapter serving `kind`.
    pub fn provider(&self, kind: ProviderKind) -> &dyn TextProvider {
        match kind {
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::Ollama => &self.ollama,
        }
    }

    /// Model listing, details and health for both backends.
    pub fn catalog(&self) -> ModelCatalog<'_> {
        ModelCatalog::new(&self.ollama, self.openai.is_configured())
    }

    /// Process a request in one round trip.
    pub async fn process(&self, request: &ProcessingRequest) -> Result<ResponseEnvelope, Error> {
        let span = request_span(request, false);

        async move {
            let started = Instant::now();

            let content = self.resolver.resolve(request).await?;
            let prompt = Prompt::build(&content.body, content.source_kind);
            let generation = generation_request(request, prompt);

            let provider = self.provider(request.provider);
            let model_used = provider.model_used(&generation);

            let result = provider.call_once(&generation).await.inspect_err(|e| {
                tracing::error!(model_used = %model_used, error = %e, "processing failed");
            })?;

            let envelope =
                ResponseEnvelope::success(result.text, model_used, started.elapsed(), &content);
            tracing::info!(
                model_used = %envelope.model_used,
                processing_time = envelope.processing_time,
                "processing completed"
            );

            Ok(envelope)
        }
        .instrument(span)
        .await
    }

    /// Process a request incrementally.
    ///
    /// Resolution failures are returned before any stream exists. Once the
    /// stream is returned, every later failure arrives as its terminal
    /// [`crate::StreamEvent::Error`].
    pub async fn process_stream(&self, request: &ProcessingRequest) -> Result<EventStream, Error> {
        let span = request_span(request, true);

        async move {
            let started = Instant::now();

            let content = self.resolver.resolve(request).await?;
            let prompt = Prompt::build(&content.body, content.source_kind);
            let generation = generation_request(request, prompt);

            let provider = self.provider(request.provider);
            let model_used = provider.model_used(&generation);
            tracing::info!(model_used = %model_used, "opening provider stream");

            let trailer = StreamTrailer::new(started, model_used, &content);
            Ok(EventStream::new(provider.call_streaming(&generation), trailer))
        }
        .instrument(span)
        .await
    }
}

fn generation_request(request: &ProcessingRequest, prompt: Prompt) -> GenerationRequest {
    GenerationRequest::new(prompt)
        .model(request.model.clone())
        .system_prompt(request.system_prompt.clone())
}

fn request_span(request: &ProcessingRequest, streaming: bool) -> tracing::Span {
    let request_id = uuid::Uuid::new_v4();
    let source = if request.url.as_deref().is_some_and(|u| !u.is_empty()) {
        "url"
    } else {
        "text"
    };

    tracing::info_span!(
        "gateway_request",
        %request_id,
        provider = request.provider.tag(),
        source,
        streaming
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_dispatch() {
        let gateway = Gateway::new(GatewayConfig::new().openai_api_key("sk-test")).unwrap();

        assert_eq!(gateway.provider(ProviderKind::OpenAI).kind(), ProviderKind::OpenAI);
        assert_eq!(gateway.provider(ProviderKind::Ollama).kind(), ProviderKind::Ollama);
    }

    #[test]
    fn test_generation_request_carries_overrides() {
        let request = ProcessingRequest::from_text("Hello")
            .model("gpt-4")
            .system_prompt("Be terse.");
        let generation = generation_request(&request, Prompt::from("p"));

        assert_eq!(generation.model.as_deref(), Some("gpt-4"));
        assert_eq!(generation.system_content(), "Be terse.");
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_dispatch() {
        let gateway = Gateway::new(
            GatewayConfig::new()
                .openai_base_url("http://127.0.0.1:9")
                .ollama_base_url("http://127.0.0.1:9"),
        )
        .unwrap();

        let err = gateway
            .process(&ProcessingRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);

        let err = gateway
            .process_stream(&ProcessingRequest::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }
}
