//! Mock Completion Source for testing.
//!
//! Scripted replies and streams are consumed in order. Every request is
//! recorded for later inspection.
//!
//! # Example
//!
//! ```ignore
//! let source = MockCompletionSource::new()
//!     .with_stream(vec![CompletionChunk::content("Hi"), CompletionChunk::finished("stop")]);
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::ports::{
    CompletionChunk, CompletionError, CompletionRequest, CompletionSource, FragmentStream,
};

type StreamScript = Vec<Result<CompletionChunk, CompletionError>>;

/// Scripted completion source.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionSource {
    replies: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    streams: Arc<Mutex<VecDeque<StreamScript>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    fragment_delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockCompletionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful `generate` reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Ok(text.into()));
        self
    }

    /// Queues a failing `generate` call.
    pub fn with_error(self, error: CompletionError) -> Self {
        lock(&self.replies).push_back(Err(error));
        self
    }

    /// Queues a stream of successful chunks.
    pub fn with_stream(self, chunks: Vec<CompletionChunk>) -> Self {
        self.with_stream_items(chunks.into_iter().map(Ok).collect())
    }

    /// Queues a stream that may contain errors.
    pub fn with_stream_items(self, items: Vec<Result<CompletionChunk, CompletionError>>) -> Self {
        lock(&self.streams).push_back(items);
        self
    }

    /// Sleeps before yielding each streamed item.
    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl CompletionSource for MockCompletionSource {
    async fn generate(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        lock(&self.requests).push(request);
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
    }

    fn stream(&self, request: CompletionRequest) -> FragmentStream {
        lock(&self.requests).push(request);
        let script = lock(&self.streams).pop_front().unwrap_or_else(|| {
            vec![
                Ok(CompletionChunk::content("Mock response")),
                Ok(CompletionChunk::finished("stop")),
            ]
        });

        let delay = self.fragment_delay;
        if delay.is_zero() {
            Box::pin(stream::iter(script))
        } else {
            Box::pin(stream::iter(script).then(move |item| async move {
                tokio::time::sleep(delay).await;
                item
            }))
        }
    }
}
