//! Hosted chat-completions provider.

pub mod client;
pub mod types;

pub use client::{OpenAIProvider, DEFAULT_OPENAI_MODEL};
