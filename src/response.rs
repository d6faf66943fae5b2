//! Normalizing provider output into the caller-facing response shapes.

use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::provider::ProviderStream;
use crate::types::streaming::finite_or_zero;
use crate::{ProviderEvent, ResolvedContent, SourceKind, StreamEvent};

/// Single-shot response, identical in shape for every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub result: String,
    pub model_used: String,
    /// Seconds from request entry to completion.
    pub processing_time: f64,
    pub source_type: SourceKind,
    pub source: String,
}

impl ResponseEnvelope {
    pub fn success(
        result: String,
        model_used: String,
        elapsed: Duration,
        content: &ResolvedContent,
    ) -> Self {
        Self {
            success: true,
            result,
            model_used,
            processing_time: finite_or_zero(elapsed.as_secs_f64()),
            source_type: content.source_kind,
            source: content.source_label.clone(),
        }
    }
}

/// Metadata attached to the terminal `Done` event.
#[derive(Debug, Clone)]
pub struct StreamTrailer {
    pub started: Instant,
    pub model_used: String,
    pub source_kind: SourceKind,
    pub source_label: String,
}

impl StreamTrailer {
    pub fn new(started: Instant, model_used: String, content: &ResolvedContent) -> Self {
        Self {
            started,
            model_used,
            source_kind: content.source_kind,
            source_label: content.source_label.clone(),
        }
    }
}

/// The caller-facing event sequence of a streaming request.
///
/// Yields zero or more [`StreamEvent::Chunk`]s followed by exactly one
/// [`StreamEvent::Done`] or [`StreamEvent::Error`], then ends. The provider
/// stream is dropped as soon as the terminal event is produced, which closes
/// the backend connection; dropping an `EventStream` early does the same.
pub struct EventStream {
    inner: Option<ProviderStream>,
    trailer: StreamTrailer,
    streamed_chars: usize,
}

impl EventStream {
    pub fn new(inner: ProviderStream, trailer: StreamTrailer) -> Self {
        Self {
            inner: Some(inner),
            trailer,
            streamed_chars: 0,
        }
    }

    /// Model identifier reported in the trailer.
    pub fn model_used(&self) -> &str {
        &self.trailer.model_used
    }

    /// Wire frames (`data: <json>\n\n`) in emission order.
    pub fn into_frames(self) -> impl Stream<Item = String> + Send {
        self.map(|event| event.to_frame())
    }

    fn finish(&mut self, event: StreamEvent) -> Poll<Option<StreamEvent>> {
        self.inner = None;

        match &event {
            StreamEvent::Done { elapsed_seconds, model_used, .. } => tracing::info!(
                model_used = %model_used,
                elapsed_seconds = *elapsed_seconds,
                streamed_chars = self.streamed_chars,
                "stream completed"
            ),
            StreamEvent::Error { message } => tracing::warn!(
                model_used = %self.trailer.model_used,
                streamed_chars = self.streamed_chars,
                error = %message,
                "stream failed"
            ),
            StreamEvent::Chunk { .. } => {}
        }

        Poll::Ready(Some(event))
    }

    fn done_event(&self) -> StreamEvent {
        StreamEvent::Done {
            elapsed_seconds: finite_or_zero(self.trailer.started.elapsed().as_secs_f64()),
            model_used: self.trailer.model_used.clone(),
            source_kind: self.trailer.source_kind,
            source_label: self.trailer.source_label.clone(),
        }
    }
}

impl Stream for EventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(ProviderEvent::Delta(text)))) => {
                self.streamed_chars += text.chars().count();
                Poll::Ready(Some(StreamEvent::Chunk { text }))
            }
            Poll::Ready(Some(Ok(ProviderEvent::Completed))) => {
                let done = self.done_event();
                self.finish(done)
            }
            Poll::Ready(Some(Err(e))) => self.finish(StreamEvent::Error {
                message: e.to_string(),
            }),
            Poll::Ready(None) => self.finish(StreamEvent::Error {
                message: "provider stream ended without completing".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use futures_util::stream;

    fn trailer() -> StreamTrailer {
        StreamTrailer::new(
            Instant::now(),
            "ollama:llama2".to_string(),
            &ResolvedContent::from_text("Hello"),
        )
    }

    fn provider_stream(items: Vec<Result<ProviderEvent, Error>>) -> ProviderStream {
        Box::pin(stream::iter(items))
    }

    #[test]
    fn test_envelope_shape() {
        let content = ResolvedContent::from_url("https://example.com", "body");
        let envelope = ResponseEnvelope::success(
            "{\"structured\":{}}".to_string(),
            "openai:gpt-3.5-turbo".to_string(),
            Duration::from_millis(1500),
            &content,
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["result"], "{\"structured\":{}}");
        assert_eq!(json["model_used"], "openai:gpt-3.5-turbo");
        assert_eq!(json["processing_time"], 1.5);
        assert_eq!(json["source_type"], "url");
        assert_eq!(json["source"], "https://example.com");
    }

    #[tokio::test]
    async fn test_deltas_then_done() {
        let events: Vec<StreamEvent> = EventStream::new(
            provider_stream(vec![
                Ok(ProviderEvent::Delta("Hi".to_string())),
                Ok(ProviderEvent::Delta(" there".to_string())),
                Ok(ProviderEvent::Completed),
            ]),
            trailer(),
        )
        .collect()
        .await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StreamEvent::Chunk { text: "Hi".to_string() });
        assert_eq!(events[1], StreamEvent::Chunk { text: " there".to_string() });
        match &events[2] {
            StreamEvent::Done {
                model_used,
                source_kind,
                source_label,
                ..
            } => {
                assert_eq!(model_used, "ollama:llama2");
                assert_eq!(*source_kind, SourceKind::Text);
                assert_eq!(source_label, "Hello");
            }
            other => panic!("Expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nothing_follows_terminal_event() {
        let events: Vec<StreamEvent> = EventStream::new(
            provider_stream(vec![
                Ok(ProviderEvent::Delta("a".to_string())),
                Ok(ProviderEvent::Completed),
                Ok(ProviderEvent::Delta("late".to_string())),
                Ok(ProviderEvent::Completed),
            ]),
            trailer(),
        )
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn test_error_keeps_partial_output() {
        let events: Vec<StreamEvent> = EventStream::new(
            provider_stream(vec![
                Ok(ProviderEvent::Delta("partial".to_string())),
                Err(Error::upstream("OpenAI", "connection reset")),
                Ok(ProviderEvent::Completed),
            ]),
            trailer(),
        )
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk { text: "partial".to_string() },
                StreamEvent::Error {
                    message: "OpenAI API error: connection reset".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_exhausted_provider_stream_becomes_error() {
        let events: Vec<StreamEvent> =
            EventStream::new(provider_stream(vec![]), trailer()).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_event() {
        let cases: Vec<Vec<Result<ProviderEvent, Error>>> = vec![
            vec![],
            vec![Ok(ProviderEvent::Completed)],
            vec![Err(Error::upstream("Ollama", "down"))],
            vec![Ok(ProviderEvent::Delta("x".to_string()))],
            vec![
                Ok(ProviderEvent::Delta("x".to_string())),
                Err(Error::upstream("Ollama", "down")),
                Ok(ProviderEvent::Completed),
            ],
        ];

        for items in cases {
            let events: Vec<StreamEvent> =
                EventStream::new(provider_stream(items), trailer()).collect().await;

            let terminals = events.iter().filter(|e| e.is_terminal()).count();
            assert_eq!(terminals, 1, "{events:?}");
            assert!(events.last().unwrap().is_terminal());
        }
    }

    #[tokio::test]
    async fn test_frames() {
        let frames: Vec<String> = EventStream::new(
            provider_stream(vec![
                Ok(ProviderEvent::Delta("Hi".to_string())),
                Ok(ProviderEvent::Completed),
            ]),
            trailer(),
        )
        .into_frames()
        .collect()
        .await;

        assert_eq!(frames[0], "data: {\"chunk\":\"Hi\",\"done\":false}\n\n");
        assert!(frames[1].starts_with("data: {\"done\":true,\"processing_time\":"));
        assert!(frames[1].ends_with(
            "\"model_used\":\"ollama:llama2\",\"source_type\":\"text\",\"source\":\"Hello\"}\n\n"
        ));
    }
}
