//! A content-processing gateway over a hosted and a local LLM provider.
//!
//! A caller submits free text or a URL. The gateway fetches and sanitizes the
//! page when needed, wraps the content in a JSON-structuring prompt, sends it
//! to either an OpenAI-compatible chat-completions API or a local Ollama
//! server, and returns a provider-independent result: one
//! [`ResponseEnvelope`], or an [`EventStream`] of chunks ending in a single
//! done or error event.

pub mod catalog;
pub mod content;
pub mod error;
pub mod gateway;
pub mod ndjson_stream;
pub mod provider;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod types;

// Re-export core types for easy usage
pub use catalog::{HealthReport, LocalModel, ModelCatalog, ModelDetails, ModelListing, ModelSummary};
pub use content::ContentResolver;
pub use error::{Error, ErrorKind};
pub use gateway::Gateway;
pub use provider::{ProviderStream, TextProvider};
pub use providers::*;
pub use response::{EventStream, ResponseEnvelope, StreamTrailer};
pub use sse_stream::SseEvent;
pub use types::*;
