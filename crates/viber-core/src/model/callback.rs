//! Webhook callbacks posted by the platform.
//!
//! The platform posts one JSON object per callback, discriminated by the
//! `event` field. [`Callback::parse`] turns a raw request body into the
//! matching variant.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::event::CallbackType;
use super::message::Message;
use super::user::UserProfile;
use crate::error::{CallbackError, CallbackResult};

/// A parsed webhook callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Callback {
    /// Webhook registration handshake.
    Webhook(WebhookCallback),
    /// A user sent a message.
    Message(MessageCallback),
    /// A user subscribed.
    Subscribed(SubscribedCallback),
    /// A user unsubscribed.
    Unsubscribed(UserEventCallback),
    /// A user opened a conversation.
    ConversationStarted(ConversationStartedCallback),
    /// A message reached the user's device.
    Delivered(UserEventCallback),
    /// A message was read.
    Seen(UserEventCallback),
    /// A message could not be delivered.
    Failed(FailedCallback),
    /// A user's client status changed.
    ClientStatus(ClientStatusCallback),
    /// Any other event.
    #[serde(other)]
    Unknown,
}

/// Webhook registration handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message_token: Option<u64>,
    #[serde(default)]
    pub chat_hostname: Option<String>,
}

/// A received message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message_token: Option<u64>,
    pub sender: UserProfile,
    pub message: Message,
    /// Whether the bot should reply without notifying the user.
    #[serde(default)]
    pub silent: bool,
    /// Reply type requested by the platform, e.g. for community chats.
    #[serde(default)]
    pub reply_type: Option<String>,
    /// Chat the message was posted in, if not a one-on-one chat.
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub chat_hostname: Option<String>,
}

/// A subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribedCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message_token: Option<u64>,
    pub user: UserProfile,
}

/// An event that only names the affected user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEventCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message_token: Option<u64>,
    pub user_id: String,
}

/// A conversation opened by a user.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationStartedCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message_token: Option<u64>,
    /// How the conversation was opened (`open`, ...).
    #[serde(rename = "type", default)]
    pub open_type: String,
    /// Deep-link context parameter.
    #[serde(default)]
    pub context: Option<String>,
    pub user: UserProfile,
    /// Whether the user is already subscribed.
    #[serde(default)]
    pub subscribed: bool,
}

/// A delivery failure.
#[derive(Debug, Clone, Deserialize)]
pub struct FailedCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message_token: Option<u64>,
    pub user_id: String,
    /// Failure description.
    #[serde(default)]
    pub desc: String,
}

/// A client status change, kept schema-less.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientStatusCallback {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Callback {
    /// Parses a raw webhook body.
    ///
    /// The callback-level `timestamp` and `message_token` are copied into the
    /// options of a received message.
    pub fn parse(body: &[u8]) -> CallbackResult<Self> {
        let mut callback: Callback =
            serde_json::from_slice(body).map_err(|e| CallbackError::parse(e.to_string()))?;

        if let Callback::Message(cb) = &mut callback {
            cb.message.options.timestamp = Some(cb.timestamp);
            cb.message.options.token = cb.message_token;
        }

        Ok(callback)
    }

    /// Returns the callback type.
    pub fn callback_type(&self) -> CallbackType {
        match self {
            Self::Webhook(_) => CallbackType::Webhook,
            Self::Message(_) => CallbackType::Message,
            Self::Subscribed(_) => CallbackType::Subscribed,
            Self::Unsubscribed(_) => CallbackType::Unsubscribed,
            Self::ConversationStarted(_) => CallbackType::ConversationStarted,
            Self::Delivered(_) => CallbackType::Delivered,
            Self::Seen(_) => CallbackType::Seen,
            Self::Failed(_) => CallbackType::Failed,
            Self::ClientStatus(_) => CallbackType::ClientStatus,
            Self::Unknown => CallbackType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageKind;
    use serde_json::json;

    #[test]
    fn test_parse_message_callback() {
        let body = json!({
            "event": "message",
            "timestamp": 1457764197627_i64,
            "message_token": 4912661846655238145_u64,
            "sender": {
                "id": "01234567890A=",
                "name": "John McClane",
                "avatar": "http://avatar.example.com",
                "country": "UK",
                "language": "en",
                "api_version": 1
            },
            "message": {
                "type": "text",
                "text": "a message to the service",
                "tracking_data": "{\"step\":3}"
            }
        })
        .to_string();

        let Callback::Message(cb) = Callback::parse(body.as_bytes()).unwrap() else {
            panic!("expected message callback");
        };
        assert_eq!(cb.sender.name, "John McClane");
        assert_eq!(cb.message.text_content(), Some("a message to the service"));
        assert_eq!(cb.message.options.token, Some(4912661846655238145));
        assert_eq!(cb.message.options.timestamp, Some(1457764197627));
        assert_eq!(
            cb.message.options.tracking_data.as_ref().unwrap().get("step"),
            Some(&json!(3))
        );
        assert!(!cb.silent);
    }

    #[test]
    fn test_parse_conversation_started() {
        let body = json!({
            "event": "conversation_started",
            "timestamp": 1457764197627_i64,
            "message_token": 4912661846655238145_u64,
            "type": "open",
            "context": "context information",
            "user": {"id": "01234567890A=", "name": "John McClane"},
            "subscribed": false
        })
        .to_string();

        let callback = Callback::parse(body.as_bytes()).unwrap();
        assert_eq!(callback.callback_type(), CallbackType::ConversationStarted);
        let Callback::ConversationStarted(cb) = callback else {
            unreachable!()
        };
        assert_eq!(cb.open_type, "open");
        assert_eq!(cb.context.as_deref(), Some("context information"));
    }

    #[test]
    fn test_parse_other_callbacks() {
        let failed = json!({
            "event": "failed",
            "timestamp": 1457764197627_i64,
            "message_token": 4912661846655238145_u64,
            "user_id": "01234567890A=",
            "desc": "failure description"
        })
        .to_string();
        assert!(matches!(
            Callback::parse(failed.as_bytes()).unwrap(),
            Callback::Failed(ref f) if f.desc == "failure description"
        ));

        let picture = json!({
            "event": "message",
            "timestamp": 1,
            "sender": {"id": "x"},
            "message": {"type": "picture", "media": "http://example.com/p.jpg"}
        })
        .to_string();
        let Callback::Message(cb) = Callback::parse(picture.as_bytes()).unwrap() else {
            panic!("expected message callback");
        };
        assert!(matches!(cb.message.kind, MessageKind::Picture(_)));

        let unknown = json!({"event": "action", "timestamp": 1}).to_string();
        assert!(matches!(
            Callback::parse(unknown.as_bytes()).unwrap(),
            Callback::Unknown
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Callback::parse(b"not json"),
            Err(CallbackError::Parse { .. })
        ));
        assert!(Callback::parse(br#"{"timestamp": 1}"#).is_err());
    }
}
