//! Foundation module - Shared domain primitives.
//!
//! Error types, timestamps and the state machine trait shared by the
//! activity, conversation and streaming modules.

mod errors;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
