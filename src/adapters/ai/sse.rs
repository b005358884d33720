//! Server-sent events decoding for streamed completions.
//!
//! Network chunks do not respect line boundaries, and a multi-byte UTF-8
//! character can be split across two chunks. Bytes are buffered until a
//! full line is available.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::ports::{CompletionChunk, CompletionError};

const DONE_MARKER: &str = "[DONE]";

/// One meaningful SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Payload of a `data:` line.
    Data(String),
    /// The `[DONE]` sentinel that ends the stream.
    Done,
}

/// Incremental line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a network chunk and returns every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Decodes whatever is left once the body has ended without a newline.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\n', '\r']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == DONE_MARKER {
        Some(SseEvent::Done)
    } else if data.trim().is_empty() {
        None
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}

fn parse_chunk(data: &str) -> Result<CompletionChunk, CompletionError> {
    serde_json::from_str(data)
        .map_err(|e| CompletionError::upstream(format!("malformed stream event: {}", e)))
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<CompletionChunk, CompletionError>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    /// Queues decoded events. Returns false once `[DONE]` was seen.
    fn queue(&mut self, events: impl IntoIterator<Item = SseEvent>) -> bool {
        for event in events {
            match event {
                SseEvent::Data(data) => self.pending.push_back(parse_chunk(&data)),
                SseEvent::Done => return false,
            }
        }
        true
    }
}

/// Turns a response body into completion chunks.
///
/// The stream ends at `[DONE]` or when the body ends, whichever comes
/// first. A body error is yielded once and ends the stream.
pub fn decode_chunks<S, E>(
    bytes: S,
) -> impl Stream<Item = Result<CompletionChunk, CompletionError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    if !state.queue(events) {
                        state.finished = true;
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(CompletionError::upstream(format!("stream interrupted: {}", e))));
                }
                None => {
                    state.finished = true;
                    let rest = state.decoder.finish();
                    state.queue(rest);
                }
            }
        }
    })
}
