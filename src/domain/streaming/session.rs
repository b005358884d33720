//! StreamSession - state of one in-flight streamed reply.

use std::time::{Duration, Instant};

use crate::domain::activity::ActivityId;
use crate::domain::foundation::{StateMachine, ValidationError};

use super::{StreamCheckpoint, StreamPhase, StreamUpdate};

/// Sequence number of the informative send.
pub const FIRST_SEQUENCE: u32 = 1;

/// State of one streamed reply, from placeholder to final text.
///
/// The session never talks to a transport itself. It hands out
/// [`StreamUpdate`] values and is told when a send succeeded.
///
/// # Invariants
///
/// - `sequence` starts at 1 and only ever grows
/// - the stream id is assigned once and never changes
/// - text is append-only and frozen once the phase is `Final`
#[derive(Debug, Clone)]
pub struct StreamSession {
    stream_id: Option<ActivityId>,
    sequence: u32,
    phase: StreamPhase,
    accumulated_text: String,
    last_flush: Option<Instant>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            stream_id: None,
            sequence: FIRST_SEQUENCE,
            phase: StreamPhase::Informative,
            accumulated_text: String::new(),
            last_flush: None,
        }
    }

    pub fn stream_id(&self) -> Option<&ActivityId> {
        self.stream_id.as_ref()
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    /// The placeholder send. It has no stream id yet.
    pub fn informative_update(&self, placeholder: &str) -> StreamUpdate {
        StreamUpdate::new(None, StreamPhase::Informative, FIRST_SEQUENCE, placeholder)
    }

    /// Records the id the transport assigned to the informative send.
    ///
    /// The informative send counts as a flush for throttling purposes.
    pub fn assign_stream_id(&mut self, id: ActivityId, now: Instant) -> Result<(), ValidationError> {
        if self.stream_id.is_some() {
            return Err(ValidationError::invalid_format(
                "stream_id",
                "already assigned for this session",
            ));
        }
        if id.as_str().trim().is_empty() {
            return Err(ValidationError::empty_field("stream_id"));
        }
        self.stream_id = Some(id);
        self.last_flush = Some(now);
        Ok(())
    }

    /// Moves to the next sequence number. Called once per upstream batch.
    pub fn advance(&mut self) -> Result<u32, ValidationError> {
        self.ensure_open()?;
        self.sequence = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| ValidationError::invalid_format("sequence", "exhausted"))?;
        Ok(self.sequence)
    }

    /// Appends a text delta in arrival order.
    pub fn append(&mut self, delta: &str) -> Result<(), ValidationError> {
        self.ensure_open()?;
        self.accumulated_text.push_str(delta);
        Ok(())
    }

    /// True when there is text to show and the last flush is older than
    /// `interval`.
    pub fn flush_due(&self, now: Instant, interval: Duration) -> bool {
        if self.accumulated_text.is_empty() {
            return false;
        }
        match self.last_flush {
            Some(last) => now.saturating_duration_since(last) > interval,
            None => true,
        }
    }

    /// Enters (or stays in) `Streaming` and builds the partial-text update.
    pub fn streaming_update(&mut self) -> Result<StreamUpdate, ValidationError> {
        let stream_id = self.require_stream_id()?;
        self.phase = self.phase.transition_to(StreamPhase::Streaming)?;
        Ok(StreamUpdate::new(
            Some(stream_id),
            self.phase,
            self.sequence,
            self.accumulated_text.clone(),
        ))
    }

    /// Marks a successful flush at `now`.
    pub fn record_flush(&mut self, now: Instant) {
        self.last_flush = Some(now);
    }

    /// Enters `Final` and builds the closing update with the full text.
    pub fn finish(&mut self) -> Result<StreamUpdate, ValidationError> {
        let stream_id = self.require_stream_id()?;
        self.phase = self.phase.transition_to(StreamPhase::Final)?;
        Ok(StreamUpdate::new(
            Some(stream_id),
            self.phase,
            self.sequence,
            self.accumulated_text.clone(),
        ))
    }

    pub fn checkpoint(&self) -> StreamCheckpoint {
        StreamCheckpoint {
            stream_id: self.stream_id.clone(),
            phase: self.phase,
            sequence: self.sequence,
            accumulated_text: self.accumulated_text.clone(),
        }
    }

    fn ensure_open(&self) -> Result<(), ValidationError> {
        if self.phase.is_terminal() {
            return Err(ValidationError::invalid_transition(
                format!("{:?}", self.phase),
                "append",
            ));
        }
        Ok(())
    }

    fn require_stream_id(&self) -> Result<ActivityId, ValidationError> {
        self.stream_id
            .clone()
            .ok_or_else(|| ValidationError::empty_field("stream_id"))
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}
