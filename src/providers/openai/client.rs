use futures_util::{stream, StreamExt, TryStreamExt};
use reqwest::Client;

use super::types::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::provider::{ProviderStream, TextProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::sse_stream::{SseEvent, SseStreamExt};
use crate::{
    Error, GatewayConfig, GenerationRequest, ProviderEvent, ProviderKind, ProviderResult,
    DEFAULT_OPENAI_BASE_URL,
};

const PROVIDER: &str = "OpenAI";

/// Model used when the request names none.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Hosted chat-completions provider.
///
/// Without an API key the provider still constructs, but every call fails
/// with [`Error::NotConfigured`] so callers can fall back to another backend.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider against the public API.
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, DEFAULT_OPENAI_BASE_URL.to_string())
    }

    /// Create a new OpenAI provider with custom base URL.
    pub fn new_with_base_url(api_key: Option<String>, base_url: String) -> Result<Self, Error> {
        // No explicit timeout: the hosted API is bounded by the client's transport defaults
        let client = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build OpenAI client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error> {
        Self::new_with_base_url(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, Error> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::not_configured(
                PROVIDER,
                "API key not configured. Please set OPENAI_API_KEY environment variable.",
            )
        })
    }

    /// Convert a generation request to chat-completions format.
    fn convert_request(&self, request: &GenerationRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model_or(DEFAULT_OPENAI_MODEL).to_string(),
            messages: vec![
                ChatMessage::system(request.system_content()),
                ChatMessage::user(request.prompt.as_str()),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
            stream: stream.then_some(true),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert one SSE event into adapter events.
    ///
    /// The hosted backend frames every payload as JSON, so a payload that
    /// does not decode means the stream is broken and is reported as an error.
    fn convert_sse_event(event: SseEvent) -> Vec<Result<ProviderEvent, Error>> {
        if event.is_done() {
            return vec![Ok(ProviderEvent::Completed)];
        }

        let data = event.data.trim();
        if data.is_empty() {
            return vec![];
        }

        let chunk = match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "malformed OpenAI stream payload");
                return vec![Err(Error::upstream(
                    PROVIDER,
                    format!("malformed stream payload: {e}"),
                ))];
            }
        };

        if let Some(error) = chunk.error {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            tracing::error!(error = %message, "OpenAI reported an error mid-stream");
            return vec![Err(Error::upstream(PROVIDER, message))];
        }

        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(|content| vec![Ok(ProviderEvent::Delta(content))])
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TextProvider for OpenAIProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_OPENAI_MODEL
    }

    async fn call_once(&self, request: &GenerationRequest) -> Result<ProviderResult, Error> {
        let api_key = self.api_key()?;
        let body = self.convert_request(request, false);

        tracing::info!(
            model = %body.model,
            prompt_chars = request.prompt.char_len(),
            "OpenAI completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(PROVIDER, &self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(model = %body.model, %status, "OpenAI completion failed");
            return Err(Error::from_status(PROVIDER, status.as_u16(), &error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(PROVIDER, format!("failed to parse response: {e}")))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream(PROVIDER, "response contained no choices"))?
            .message
            .content
            .unwrap_or_default();

        Ok(ProviderResult {
            text: text.trim().to_string(),
        })
    }

    fn call_streaming(&self, request: &GenerationRequest) -> ProviderStream {
        let api_key = match self.api_key() {
            Ok(key) => key.to_string(),
            Err(e) => return Box::pin(stream::once(async move { Err::<ProviderEvent, Error>(e) })),
        };

        let body = self.convert_request(request, true);
        tracing::info!(
            model = %body.model,
            prompt_chars = request.prompt.char_len(),
            "OpenAI stream request"
        );

        let pending = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send();
        let base_url = self.base_url.clone();

        let opened = async move {
            let response = pending
                .await
                .map_err(|e| Error::transport(PROVIDER, &base_url, e))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!(%status, "OpenAI stream request failed");
                return Err(Error::from_status(PROVIDER, status.as_u16(), &error_text));
            }

            let events = response
                .bytes_stream()
                .sse_events(PROVIDER)
                .map(|sse_result| match sse_result {
                    Ok(sse_event) => Self::convert_sse_event(sse_event),
                    Err(e) => vec![Err(e)],
                })
                .flat_map(stream::iter)
                // The body ending without `[DONE]` still counts as completion
                .chain(stream::once(async { Ok(ProviderEvent::Completed) }));

            Ok::<ProviderStream, Error>(Box::pin(events))
        };

        Box::pin(stream::once(opened).try_flatten())
    }
}
