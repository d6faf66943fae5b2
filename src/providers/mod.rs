//! Provider implementations for the supported generation backends.

pub mod ollama;
pub mod openai;

// Re-export commonly used provider types
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
