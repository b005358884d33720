//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application handlers and the outside world. Adapters implement
//! these ports.
//!
//! - `CompletionSource` - Language-model completions, whole or streamed
//! - `Transport` / `TransportFactory` - Outbound chat activities
//! - `ConversationDirectory` - Stored conversation addresses
//! - `Clock` - Monotonic time for flush throttling

mod clock;
mod completion_source;
mod conversation_directory;
mod transport;

pub use clock::Clock;
pub use completion_source::{
    ChunkChoice, ChunkDelta, CompletionChunk, CompletionError, CompletionRequest,
    CompletionSource, FragmentStream, Message, MessageRole,
};
pub use conversation_directory::{ConversationDirectory, DirectoryError};
pub use transport::{Transport, TransportError, TransportFactory};
