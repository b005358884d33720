//! Streaming reply handling.

mod coordinator;
mod errors;

pub use coordinator::{StreamCoordinator, StreamingConfig};
pub use errors::StreamError;
