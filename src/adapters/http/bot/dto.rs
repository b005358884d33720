//! Request and response bodies for the bot endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::handlers::conversation::{ProactiveContent, SendProactiveCommand};

/// Body of `POST /api/notify`.
///
/// ```json
/// { "recipient": "Ada Lovelace", "type": "text", "content": "Build finished" }
/// { "recipient": "a:1x2y3z...", "type": "card", "content": { "type": "AdaptiveCard", ... } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyRequest {
    /// Conversation id, AAD object id or display name.
    pub recipient: String,
    #[serde(rename = "type")]
    pub kind: NotifyKind,
    pub content: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    Text,
    Card,
}

impl TryFrom<NotifyRequest> for SendProactiveCommand {
    type Error = String;

    fn try_from(request: NotifyRequest) -> Result<Self, Self::Error> {
        if request.recipient.trim().is_empty() {
            return Err("recipient cannot be empty".to_string());
        }
        let content = match (request.kind, request.content) {
            (NotifyKind::Text, Value::String(text)) => ProactiveContent::Text(text),
            (NotifyKind::Text, _) => return Err("text content must be a string".to_string()),
            (NotifyKind::Card, card @ Value::Object(_)) => ProactiveContent::Card(card),
            (NotifyKind::Card, _) => return Err("card content must be an object".to_string()),
        };
        Ok(SendProactiveCommand {
            recipient: request.recipient,
            content,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResponse {
    pub activity_id: String,
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Result<SendProactiveCommand, String> {
        let request: NotifyRequest = serde_json::from_value(body).map_err(|e| e.to_string())?;
        SendProactiveCommand::try_from(request)
    }

    #[test]
    fn text_notification_converts() {
        let command = parse(json!({
            "recipient": "Ada Lovelace",
            "type": "text",
            "content": "Build finished"
        }))
        .unwrap();

        assert_eq!(command.recipient, "Ada Lovelace");
        assert_eq!(command.content, ProactiveContent::Text("Build finished".to_string()));
    }

    #[test]
    fn card_notification_keeps_card_json() {
        let card = json!({ "type": "AdaptiveCard", "version": "1.6", "body": [] });
        let command = parse(json!({
            "recipient": "a:1x2y3z",
            "type": "card",
            "content": card
        }))
        .unwrap();

        assert_eq!(command.content, ProactiveContent::Card(card));
    }

    #[test]
    fn mismatched_content_is_rejected() {
        assert!(parse(json!({ "recipient": "x", "type": "text", "content": { "a": 1 } })).is_err());
        assert!(parse(json!({ "recipient": "x", "type": "card", "content": "hello" })).is_err());
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        assert!(parse(json!({ "recipient": "x", "type": "video", "content": "clip.mp4" })).is_err());
    }

    #[test]
    fn blank_recipient_is_rejected() {
        assert!(parse(json!({ "recipient": " ", "type": "text", "content": "hi" })).is_err());
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::not_found("Conversation", "nobody")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Conversation not found: nobody");
        assert!(json.get("details").is_none());
    }
}
