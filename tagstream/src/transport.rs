// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Transport boundary
//
// The core only pulls chunks from an abstract source. Whatever carries
// them (HTTP, socket, in-process channel) lives behind `Transport`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::context::RequestContext;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the transport. Fatal to the current session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("stream interrupted: {0}")]
    Interrupted(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Pull-based source of text chunks.
///
/// Chunks are either deltas or cumulative snapshots; the session
/// normalizes both.
#[async_trait]
pub trait ChunkSource: Send {
    /// Next chunk, or `None` once the stream is done.
    async fn next_chunk(&mut self) -> Result<Option<String>, TransportError>;
}

/// Issues a request and returns the source of its response chunks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        request: &str,
        context: &RequestContext,
    ) -> Result<Box<dyn ChunkSource>, TransportError>;
}

// ---------------------------------------------------------------------------
// Stream adapter
// ---------------------------------------------------------------------------

/// Adapts any stream of chunk results into a `ChunkSource`.
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = Result<String, TransportError>> + Unpin + Send,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> ChunkSource for StreamSource<S>
where
    S: Stream<Item = Result<String, TransportError>> + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<String>, TransportError> {
        self.inner.next().await.transpose()
    }
}

/// Channel-backed source: the sender side is handed to whatever produces chunks.
pub type ChannelSource = StreamSource<ReceiverStream<Result<String, TransportError>>>;

/// Create a bounded channel and the source reading from it.
/// The stream ends when every sender is dropped.
pub fn channel_source(
    buffer: usize,
) -> (mpsc::Sender<Result<String, TransportError>>, ChannelSource) {
    let (tx, rx) = mpsc::channel(buffer);
    (tx, StreamSource::new(ReceiverStream::new(rx)))
}

// ---------------------------------------------------------------------------
// Replay transport
// ---------------------------------------------------------------------------

/// Transport that answers every request with the same recorded chunks.
#[derive(Debug, Clone, Default)]
pub struct ReplayTransport {
    chunks: Vec<String>,
    delay: Option<Duration>,
}

impl ReplayTransport {
    pub fn new(chunks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            delay: None,
        }
    }

    /// Wait `delay` before handing out each chunk.
    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay.filter(|d| !d.is_zero());
        self
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn open(
        &self,
        _request: &str,
        _context: &RequestContext,
    ) -> Result<Box<dyn ChunkSource>, TransportError> {
        Ok(Box::new(ReplaySource {
            chunks: self.chunks.clone().into_iter(),
            delay: self.delay,
        }))
    }
}

struct ReplaySource {
    chunks: std::vec::IntoIter<String>,
    delay: Option<Duration>,
}

#[async_trait]
impl ChunkSource for ReplaySource {
    async fn next_chunk(&mut self) -> Result<Option<String>, TransportError> {
        if let Some(delay) = self.delay {
            if !self.chunks.as_slice().is_empty() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(self.chunks.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextBuilder, ConversationState};

    #[tokio::test]
    async fn stream_source_yields_chunks_then_none() {
        let mut source = StreamSource::new(tokio_stream::iter(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
        ]));
        assert_eq!(source.next_chunk().await.unwrap().as_deref(), Some("a"));
        assert_eq!(source.next_chunk().await.unwrap().as_deref(), Some("b"));
        assert_eq!(source.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stream_source_surfaces_errors() {
        let mut source = StreamSource::new(tokio_stream::iter(vec![
            Ok("a".to_string()),
            Err(TransportError::Interrupted("reset".to_string())),
        ]));
        source.next_chunk().await.unwrap();
        let err = source.next_chunk().await.unwrap_err();
        assert_eq!(err, TransportError::Interrupted("reset".to_string()));
    }

    #[tokio::test]
    async fn channel_source_ends_when_sender_dropped() {
        let (tx, mut source) = channel_source(4);
        tx.send(Ok("x".to_string())).await.unwrap();
        drop(tx);
        assert_eq!(source.next_chunk().await.unwrap().as_deref(), Some("x"));
        assert_eq!(source.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn replay_transport_replays_for_every_request() {
        let transport = ReplayTransport::new(["one", "two"]);
        let state = ConversationState::default();
        let ctx = ContextBuilder::new(&state).build();

        for _ in 0..2 {
            let mut source = transport.open("hi", &ctx).await.unwrap();
            let mut got = Vec::new();
            while let Some(chunk) = source.next_chunk().await.unwrap() {
                got.push(chunk);
            }
            assert_eq!(got, vec!["one", "two"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replay_transport_paces_chunks() {
        let transport =
            ReplayTransport::new(["a", "b"]).with_delay(Some(Duration::from_millis(250)));
        let state = ConversationState::default();
        let ctx = ContextBuilder::new(&state).build();
        let mut source = transport.open("hi", &ctx).await.unwrap();

        let started = tokio::time::Instant::now();
        source.next_chunk().await.unwrap();
        source.next_chunk().await.unwrap();
        assert_eq!(source.next_chunk().await.unwrap(), None);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn error_display() {
        let err = TransportError::Timeout("30s".to_string());
        assert_eq!(err.to_string(), "request timed out: 30s");
    }
}
