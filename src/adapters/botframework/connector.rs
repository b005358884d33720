//! Bot Framework connector client and the transport built on it.
//!
//! Activities are posted to the conversation's service URL:
//!
//! ```text
//! POST {serviceUrl}/v3/conversations/{conversationId}/activities
//! POST {serviceUrl}/v3/conversations/{conversationId}/activities/{replyToId}
//! ```
//!
//! Streaming updates are posted the same way. Teams merges them into the
//! message named by the `streamId` of their `streaminfo` entity.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::domain::activity::{Activity, ActivityId, ActivityType};
use crate::domain::conversation::ConversationAddress;
use crate::ports::{Transport, TransportError, TransportFactory};

use super::auth::BotTokenProvider;

/// Body returned by the connector for a posted activity.
#[derive(Debug, Default, Deserialize)]
struct ResourceResponse {
    #[serde(default)]
    id: String,
}

/// Builds the activities endpoint for a conversation.
pub fn activities_url(
    service_url: &str,
    conversation_id: &str,
    reply_to_id: Option<&ActivityId>,
) -> Result<Url, TransportError> {
    let mut url = Url::parse(service_url)
        .map_err(|e| TransportError::network(format!("invalid service URL {}: {}", service_url, e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| TransportError::network(format!("service URL cannot be a base: {}", service_url)))?;
        segments
            .pop_if_empty()
            .extend(["v3", "conversations", conversation_id, "activities"]);
        if let Some(id) = reply_to_id {
            segments.push(id.as_str());
        }
    }
    Ok(url)
}

/// HTTP client for the connector REST API.
#[derive(Debug, Clone)]
pub struct ConnectorClient {
    client: Client,
    tokens: Arc<BotTokenProvider>,
}

impl ConnectorClient {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(tokens: Arc<BotTokenProvider>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, tokens))
    }

    pub fn with_client(client: Client, tokens: Arc<BotTokenProvider>) -> Self {
        Self { client, tokens }
    }

    /// Posts an activity that already carries its routing fields.
    ///
    /// Returns the id the channel assigned. Typing indicators may come back
    /// without one, in which case the id is empty.
    pub async fn post_activity(&self, activity: &Activity) -> Result<ActivityId, TransportError> {
        let service_url = activity
            .service_url
            .as_deref()
            .ok_or_else(|| TransportError::network("activity has no service URL"))?;
        let url = activities_url(
            service_url,
            activity.conversation_id(),
            activity.reply_to_id.as_ref(),
        )?;

        let mut request = self.client.post(url).json(activity);
        if let Some(token) = self.tokens.token().await? {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::network("connector request timed out")
            } else {
                TransportError::network(format!("connector request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::rejected(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::invalid_response(e.to_string()))?;
        let parsed = if body.trim().is_empty() {
            ResourceResponse::default()
        } else {
            serde_json::from_str::<ResourceResponse>(&body)
                .map_err(|e| TransportError::invalid_response(e.to_string()))?
        };

        if parsed.id.is_empty() && activity.activity_type != ActivityType::Typing {
            return Err(TransportError::invalid_response("response carried no activity id"));
        }
        Ok(ActivityId::new(parsed.id))
    }
}

/// Transport bound to one conversation address.
#[derive(Debug, Clone)]
pub struct ConnectorTransport {
    client: ConnectorClient,
    address: ConversationAddress,
    reply: bool,
}

impl ConnectorTransport {
    /// Replies thread under the activity the address was captured from.
    pub fn reply(client: ConnectorClient, address: ConversationAddress) -> Self {
        Self {
            client,
            address,
            reply: true,
        }
    }

    /// Starts a new message in the conversation.
    pub fn proactive(client: ConnectorClient, address: ConversationAddress) -> Self {
        Self {
            client,
            address,
            reply: false,
        }
    }

    fn addressed(&self, activity: Activity) -> Activity {
        self.address.apply_to(activity, self.reply)
    }
}

#[async_trait]
impl Transport for ConnectorTransport {
    async fn send(&self, activity: Activity) -> Result<ActivityId, TransportError> {
        let activity = self.addressed(activity);
        self.client.post_activity(&activity).await.map_err(|e| {
            tracing::warn!(
                conversation_id = %self.address.conversation_id(),
                error = %e,
                "Failed to send activity"
            );
            e
        })
    }

    async fn update(&self, id: &ActivityId, activity: Activity) -> Result<(), TransportError> {
        let mut activity = self.addressed(activity);
        activity.id = Some(id.clone());
        self.client.post_activity(&activity).await.map(|_| ()).map_err(|e| {
            tracing::warn!(
                conversation_id = %self.address.conversation_id(),
                activity_id = %id.as_str(),
                error = %e,
                "Failed to update activity"
            );
            e
        })
    }
}

/// Builds connector transports sharing one client.
#[derive(Debug, Clone)]
pub struct ConnectorTransportFactory {
    client: ConnectorClient,
}

impl ConnectorTransportFactory {
    pub fn new(client: ConnectorClient) -> Self {
        Self { client }
    }
}

impl TransportFactory for ConnectorTransportFactory {
    fn for_conversation(&self, address: &ConversationAddress) -> Arc<dyn Transport> {
        Arc::new(ConnectorTransport::reply(self.client.clone(), address.clone()))
    }

    fn proactive(&self, address: &ConversationAddress) -> Arc<dyn Transport> {
        Arc::new(ConnectorTransport::proactive(self.client.clone(), address.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activity::{ChannelAccount, ConversationAccount};

    fn address() -> ConversationAddress {
        let mut activity = Activity::message("hi").with_id(ActivityId::new("in-7"));
        activity.service_url = Some("https://smba.example.net/amer/".to_string());
        activity.from = Some(ChannelAccount::new("29:user"));
        activity.recipient = Some(ChannelAccount::new("28:bot"));
        activity.conversation = Some(ConversationAccount::new("a:1x2y3z"));
        ConversationAddress::from_activity(&activity).unwrap()
    }

    fn client() -> ConnectorClient {
        ConnectorClient::with_client(
            Client::new(),
            Arc::new(BotTokenProvider::anonymous(Client::new())),
        )
    }

    mod urls {
        use super::*;

        #[test]
        fn new_message_posts_to_conversation_activities() {
            let url = activities_url("https://smba.example.net/amer/", "a:1x2y3z", None).unwrap();
            assert_eq!(
                url.as_str(),
                "https://smba.example.net/amer/v3/conversations/a:1x2y3z/activities"
            );
        }

        #[test]
        fn reply_appends_reply_to_id() {
            let reply_to = ActivityId::new("in-7");
            let url =
                activities_url("https://smba.example.net/amer", "a:1x2y3z", Some(&reply_to)).unwrap();
            assert_eq!(
                url.as_str(),
                "https://smba.example.net/amer/v3/conversations/a:1x2y3z/activities/in-7"
            );
        }

        #[test]
        fn emulator_service_url_without_path_works() {
            let url = activities_url("http://localhost:50123", "conv", None).unwrap();
            assert_eq!(url.as_str(), "http://localhost:50123/v3/conversations/conv/activities");
        }

        #[test]
        fn invalid_service_url_is_rejected() {
            assert!(activities_url("not a url", "conv", None).is_err());
        }
    }

    mod transport {
        use super::*;

        #[test]
        fn reply_transport_threads_under_inbound_activity() {
            let transport = ConnectorTransport::reply(client(), address());
            let outbound = transport.addressed(Activity::message("answer"));

            assert_eq!(outbound.reply_to_id, Some(ActivityId::new("in-7")));
            assert_eq!(outbound.recipient.unwrap().id, "29:user");
        }

        #[test]
        fn proactive_transport_starts_new_message() {
            let transport = ConnectorTransport::proactive(client(), address());
            let outbound = transport.addressed(Activity::message("ping"));
            assert!(outbound.reply_to_id.is_none());
        }

        #[tokio::test]
        async fn unreachable_channel_is_a_network_error() {
            let mut activity = Activity::message("hi");
            activity.service_url = Some("http://127.0.0.1:9/".to_string());
            activity.conversation = Some(ConversationAccount::new("conv"));

            let result = client().post_activity(&activity).await;
            assert!(matches!(result, Err(TransportError::Network(_))));
        }

        #[tokio::test]
        async fn activity_without_service_url_is_rejected_locally() {
            let result = client().post_activity(&Activity::message("hi")).await;
            assert!(matches!(result, Err(TransportError::Network(_))));
        }
    }
}
