//! Stream adapter for parsing SSE (Server-Sent Events) from byte chunks.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::ndjson_stream::LineStream;
use crate::Error;

/// A Server-Sent Events (SSE) event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseEvent {
    /// Event type (optional).
    pub event_type: Option<String>,
    /// Event data, multiple `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
        }
    }

    /// Check if this is the `[DONE]` sentinel that ends chat-completion streams.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Parses SSE events out of a byte stream, one blank-line-terminated block
/// at a time. Blocks without any `data:` field are dropped.
pub struct SseStream<S> {
    lines: LineStream<S>,
    source: &'static str,
    event_type: Option<String>,
    data_lines: Vec<String>,
}

impl<S> SseStream<S> {
    pub fn new(stream: S, source: &'static str) -> Self {
        Self {
            lines: LineStream::new(stream, source),
            source,
            event_type: None,
            data_lines: Vec::new(),
        }
    }

    /// Apply one line to the event being built; returns a finished event on
    /// a blank line.
    fn push_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment line
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);

        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = self.event_type.take();
        if self.data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: std::mem::take(&mut self.data_lines).join("\n"),
        })
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(self.lines.poll_next_unpin(cx)) {
                Some(Ok(line)) => {
                    let text = match std::str::from_utf8(&line) {
                        Ok(text) => text.to_string(),
                        Err(e) => {
                            return Poll::Ready(Some(Err(Error::upstream(
                                self.source,
                                format!("invalid UTF-8 in SSE event: {e}"),
                            ))));
                        }
                    };

                    if let Some(event) = self.push_line(&text) {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                // A final event may arrive without its terminating blank line
                None => return Poll::Ready(self.dispatch().map(Ok)),
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    /// Parse this byte stream as SSE events, attributing errors to `source`.
    fn sse_events(self, source: &'static str) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self, source)
    }
}

impl<S: Stream> SseStreamExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn byte_stream(
        chunks: Vec<Vec<u8>>,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))))
    }

    #[tokio::test]
    async fn test_sse_stream_complete_events() {
        let mut sse = byte_stream(vec![b"data: Hello\n\ndata: World\n\n".to_vec()]).sse_events("test");

        assert_eq!(sse.next().await.unwrap().unwrap().data, "Hello");
        assert_eq!(sse.next().await.unwrap().unwrap().data, "World");
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_split_events() {
        let mut sse = byte_stream(vec![
            b"data: Hel".to_vec(),
            b"lo World\n\ndata: ".to_vec(),
            b"Second\n\n".to_vec(),
        ])
        .sse_events("test");

        assert_eq!(sse.next().await.unwrap().unwrap().data, "Hello World");
        assert_eq!(sse.next().await.unwrap().unwrap().data, "Second");
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_multiline_and_comments() {
        let mut sse = byte_stream(vec![
            b": keep-alive\n\nevent: message\ndata: Line 1\ndata: Line 2\n\n".to_vec(),
        ])
        .sse_events("test");

        let event = sse.next().await.unwrap().unwrap();
        assert_eq!(event.event_type.as_deref(), Some("message"));
        assert_eq!(event.data, "Line 1\nLine 2");
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_crlf_separators() {
        let mut sse = byte_stream(vec![b"data: one\r\n\r\ndata: two\r\n\r\n".to_vec()]).sse_events("test");

        assert_eq!(sse.next().await.unwrap().unwrap().data, "one");
        assert_eq!(sse.next().await.unwrap().unwrap().data, "two");
    }

    #[tokio::test]
    async fn test_sse_stream_ends_without_final_newline() {
        let mut sse = byte_stream(vec![b"data: First event\n\n".to_vec(), b"data: [DONE]".to_vec()])
            .sse_events("test");

        assert_eq!(sse.next().await.unwrap().unwrap().data, "First event");

        let last = sse.next().await.unwrap().unwrap();
        assert!(last.is_done());
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_invalid_utf8_error() {
        let mut sse = byte_stream(vec![b"data: Valid start \xFF\xFE invalid bytes\n\n".to_vec()])
            .sse_events("OpenAI");

        let result = sse.next().await.unwrap();
        assert!(result.unwrap_err().to_string().contains("invalid UTF-8"));
    }
}
