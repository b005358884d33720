//! Completion source adapters.
//!
//! - `OpenAICompletionSource` - OpenAI or Azure OpenAI chat completions
//! - `MockCompletionSource` - scripted double for tests

mod mock;
mod openai;
mod sse;

pub use mock::MockCompletionSource;
pub use openai::{OpenAICompletionSource, OpenAIConfig};
pub use sse::{decode_chunks, SseDecoder, SseEvent};
