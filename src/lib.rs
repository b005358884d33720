//! Relay Bot - chat webhook bot backed by a language model
//!
//! Receives Bot Framework activities from Microsoft Teams (or the emulator),
//! forwards user messages to an OpenAI-compatible completion endpoint and
//! sends the answer back, either in one message or as a progressively
//! updated stream.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
