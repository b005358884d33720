//! Bot Framework connector adapters.
//!
//! - `ConnectorClient` / `ConnectorTransport` - REST delivery of activities
//! - `BotTokenProvider` - client-credentials tokens for the connector
//! - `RecordingTransport` - in-memory double that records every call

mod auth;
mod connector;
mod recording_transport;

pub use auth::{BotCredentials, BotTokenProvider, BOT_FRAMEWORK_SCOPE};
pub use connector::{activities_url, ConnectorClient, ConnectorTransport, ConnectorTransportFactory};
pub use recording_transport::{RecordingTransport, RecordingTransportFactory, TransportCall};
