//! Domain layer containing protocol types and streaming state.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (errors, timestamps, state machine trait)
//! - `activity` - Chat activity schema and mention handling
//! - `streaming` - Stream session state, phases and per-send updates
//! - `conversation` - Conversation addresses and identifier lookup

pub mod activity;
pub mod conversation;
pub mod foundation;
pub mod streaming;
