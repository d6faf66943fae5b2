//! Types for streaming responses.

use serde::Serialize;

use super::request::SourceKind;

/// Item produced by a provider adapter while streaming.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// An incremental piece of generated text.
    Delta(String),
    /// The backend signalled the end of generation.
    Completed,
}

/// Backend-agnostic event delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of generated text.
    Chunk { text: String },
    /// The stream finished; carries timing and provenance.
    Done {
        elapsed_seconds: f64,
        model_used: String,
        source_kind: SourceKind,
        source_label: String,
    },
    /// The stream failed; no further events follow.
    Error { message: String },
}

impl StreamEvent {
    /// True for `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }

    /// Encode as a server-pushed text frame: `data: <json>\n\n`.
    pub fn to_frame(&self) -> String {
        let payload = match self {
            StreamEvent::Chunk { text } => serde_json::to_string(&ChunkFrame {
                chunk: text,
                done: false,
            }),
            StreamEvent::Done {
                elapsed_seconds,
                model_used,
                source_kind,
                source_label,
            } => serde_json::to_string(&DoneFrame {
                done: true,
                processing_time: finite_or_zero(*elapsed_seconds),
                model_used,
                source_type: *source_kind,
                source: source_label,
            }),
            StreamEvent::Error { message } => serde_json::to_string(&ErrorFrame { error: message }),
        };

        // The frame structs only hold strings, bools and finite floats.
        let json = payload.unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("failed to encode stream event: {e}") })
                .to_string()
        });

        format!("data: {json}\n\n")
    }
}

#[derive(Serialize)]
struct ChunkFrame<'a> {
    chunk: &'a str,
    done: bool,
}

#[derive(Serialize)]
struct DoneFrame<'a> {
    done: bool,
    processing_time: f64,
    model_used: &'a str,
    source_type: SourceKind,
    source: &'a str,
}

#[derive(Serialize)]
struct ErrorFrame<'a> {
    error: &'a str,
}

pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
