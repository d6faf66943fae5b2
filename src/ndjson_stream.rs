//! Stream adapter splitting a byte stream into newline-terminated lines.
//!
//! Used directly for newline-delimited JSON bodies and as the framing layer
//! underneath [`crate::sse_stream::SseStream`].

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::Error;

/// Upper bound on a single unterminated line.
const MAX_LINE_BYTES: usize = 1_000_000;

/// Yields each line of the underlying byte stream, without its terminator.
///
/// `\n` and `\r\n` both end a line. Empty lines are yielded as empty
/// [`Bytes`]. A trailing line without a terminator is yielded when the
/// underlying stream ends.
pub struct LineStream<S> {
    inner: S,
    /// Provider the bytes come from, used to attribute transport errors
    source: &'static str,
    /// Bytes after the last complete line
    buffer: Vec<u8>,
    /// Complete lines not yet yielded
    lines: VecDeque<Bytes>,
    finished: bool,
}

impl<S> LineStream<S> {
    pub fn new(stream: S, source: &'static str) -> Self {
        Self {
            inner: stream,
            source,
            buffer: Vec::new(),
            lines: VecDeque::new(),
            finished: false,
        }
    }

    fn split_buffer(&mut self) {
        let mut start = 0;

        while let Some(pos) = memchr(b'\n', &self.buffer[start..]) {
            let end = start + pos;
            self.lines.push_back(Self::line(&self.buffer[start..end]));
            start = end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
    }

    fn line(raw: &[u8]) -> Bytes {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        Bytes::copy_from_slice(raw)
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<Bytes, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(line) = self.lines.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }

            if self.finished {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.split_buffer();

                    if self.buffer.len() > MAX_LINE_BYTES {
                        self.buffer.clear();
                        self.finished = true;
                        return Poll::Ready(Some(Err(Error::upstream(
                            self.source,
                            "stream line exceeded maximum size",
                        ))));
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(Error::upstream(
                        self.source,
                        format!("stream interrupted: {e}"),
                    ))));
                }
                None => {
                    self.finished = true;
                    if !self.buffer.is_empty() {
                        let rest = std::mem::take(&mut self.buffer);
                        self.lines.push_back(Self::line(&rest));
                    }
                }
            }
        }
    }
}

/// Extension trait to add line splitting to byte streams.
pub trait LineStreamExt: Stream {
    /// Split this byte stream into lines, attributing errors to `source`.
    fn lines_from(self, source: &'static str) -> LineStream<Self>
    where
        Self: Sized,
    {
        LineStream::new(self, source)
    }
}

impl<S: Stream> LineStreamExt for S {}
