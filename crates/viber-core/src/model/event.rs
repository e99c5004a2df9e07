//! Event kinds.
//!
//! Two vocabularies exist:
//!
//! - [`CallbackType`]: what the platform posts to the webhook, and what
//!   `set_webhook` subscribes to.
//! - [`EventKind`]: what a bot lets handlers register for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Events a bot can register handlers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A message was received.
    Message,
    /// A message was sent by the bot.
    MessageSent,
    /// A user subscribed.
    Subscribed,
    /// A user unsubscribed.
    Unsubscribed,
    /// A user opened a conversation with the bot.
    ConversationStarted,
    /// Processing failed.
    Error,
    /// The platform could not deliver a message.
    Failed,
}

impl EventKind {
    /// Every event kind, in documentation order.
    pub const ALL: [EventKind; 7] = [
        Self::Message,
        Self::MessageSent,
        Self::Subscribed,
        Self::Unsubscribed,
        Self::ConversationStarted,
        Self::Error,
        Self::Failed,
    ];

    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::MessageSent => "message_sent",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::ConversationStarted => "conversation_started",
            Self::Error => "error",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind: {s}"))
    }
}

/// Callback types posted by the platform to the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackType {
    /// Sent once when the webhook is registered.
    Webhook,
    Message,
    Subscribed,
    Unsubscribed,
    ConversationStarted,
    Delivered,
    Seen,
    Failed,
    ClientStatus,
    /// A callback type this SDK does not know.
    #[serde(other)]
    Unknown,
}

impl CallbackType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Message => "message",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::ConversationStarted => "conversation_started",
            Self::Delivered => "delivered",
            Self::Seen => "seen",
            Self::Failed => "failed",
            Self::ClientStatus => "client_status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENTED: [&str; 7] = [
        "message",
        "message_sent",
        "subscribed",
        "unsubscribed",
        "conversation_started",
        "error",
        "failed",
    ];

    #[test]
    fn test_event_kinds_are_documented() {
        for kind in EventKind::ALL {
            assert!(DOCUMENTED.contains(&kind.as_str()), "{kind} not documented");
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::from(kind.as_str())
            );
        }
        assert!("delivered".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_unknown_callback_type() {
        let parsed: CallbackType = serde_json::from_str("\"action\"").unwrap();
        assert_eq!(parsed, CallbackType::Unknown);
        let parsed: CallbackType = serde_json::from_str("\"client_status\"").unwrap();
        assert_eq!(parsed, CallbackType::ClientStatus);
    }
}
