use futures_util::Stream;
use std::pin::Pin;

use crate::{Error, GenerationRequest, ProviderEvent, ProviderKind, ProviderResult};

/// Lazy, finite sequence of adapter events. Dropping it abandons the
/// backend connection.
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<ProviderEvent, Error>> + Send>>;

/// Sampling temperature sent to every backend.
pub const TEMPERATURE: f32 = 0.7;

/// Output token cap sent to every backend.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// A text-generation backend reachable over HTTP.
///
/// Implementations differ in transport shape but share this two-mode
/// contract: a single-shot call returning the whole text, and a streaming
/// call returning incremental deltas.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync + 'static {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Model used when the request names none.
    fn default_model(&self) -> &'static str;

    /// Provenance string reported to callers, `"<tag>:<model>"`.
    fn model_used(&self, request: &GenerationRequest) -> String {
        format!(
            "{}:{}",
            self.kind().tag(),
            request.model_or(self.default_model())
        )
    }

    /// Generate the full response in one round trip.
    async fn call_once(&self, request: &GenerationRequest) -> Result<ProviderResult, Error>;

    /// Generate the response incrementally.
    ///
    /// Never fails synchronously: a configuration or connection problem is
    /// delivered as the stream's first and only item.
    fn call_streaming(&self, request: &GenerationRequest) -> ProviderStream;
}
