//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - OpenAI / Azure OpenAI completions, scripted mock
//! - `botframework` - connector REST client, token provider, recording double
//! - `clock` - system and manual clocks
//! - `directory` - PostgreSQL and in-memory conversation directories
//! - `http` - axum webhook endpoints

pub mod ai;
pub mod botframework;
pub mod clock;
pub mod directory;
pub mod http;
