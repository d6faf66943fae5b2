//! Core types used throughout the library.

pub mod config;
pub mod content;
pub mod prompt;
pub mod request;
pub mod streaming;

// Re-export commonly used types
pub use config::*;
pub use content::*;
pub use prompt::*;
pub use request::*;
pub use streaming::*;
