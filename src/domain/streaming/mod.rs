//! Streaming module - incremental reply state.
//!
//! A streamed reply is one outbound message that is first shown as a
//! placeholder, then patched with partial text, then replaced by the
//! final text. All sends share a stream id and carry a strictly
//! increasing sequence number.

use std::time::Duration;

mod phase;
mod session;
mod update;

pub use phase::StreamPhase;
pub use session::{StreamSession, FIRST_SEQUENCE};
pub use update::{StreamCheckpoint, StreamUpdate};

/// Minimum time between two partial-text flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

/// Placeholder text of the informative send.
pub const INFORMATIVE_TEXT: &str = "Getting the information...";
