//! Conversation directory adapters.
//!
//! - `PostgresConversationDirectory` - production storage, one connection per call
//! - `InMemoryConversationDirectory` - process-local double for tests

mod in_memory;
mod postgres;

pub use in_memory::InMemoryConversationDirectory;
pub use postgres::{PostgresConversationDirectory, DEFAULT_TABLE};
