//! Local inference server provider.

pub mod client;
pub mod types;

pub use client::{OllamaProvider, DEFAULT_OLLAMA_MODEL};
