//! API request bodies for the Viber REST API.
//!
//! This module defines the structures posted to the platform. Every request
//! goes to `{api_url}{endpoint}` with the `X-Viber-Auth-Token` header.

use serde::{Deserialize, Serialize};

use super::event::CallbackType;
use super::message::Message;

/// Endpoint names, relative to the API base URL.
pub mod endpoint {
    pub const SET_WEBHOOK: &str = "set_webhook";
    pub const SEND_MESSAGE: &str = "send_message";
    pub const POST: &str = "post";
    pub const GET_ACCOUNT_INFO: &str = "get_account_info";
    pub const GET_USER_DETAILS: &str = "get_user_details";
    pub const GET_ONLINE: &str = "get_online";
}

/// Header carrying the account's auth token.
pub const AUTH_TOKEN_HEADER: &str = "X-Viber-Auth-Token";

/// Header carrying the HMAC signature of a webhook body.
pub const SIGNATURE_HEADER: &str = "X-Viber-Content-Signature";

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://chatapi.viber.com/pa/";

/// The bot identity shown next to sent messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Sender {
    /// Creates a sender, dropping an empty avatar.
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        let avatar = avatar.into();
        Self {
            name: name.into(),
            avatar: (!avatar.is_empty()).then_some(avatar),
        }
    }
}

/// Parameters for `set_webhook`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetWebhookParams {
    pub url: String,
    #[serde(default)]
    pub is_inline: bool,
    /// Callback types to receive; platform defaults when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_types: Option<Vec<CallbackType>>,
    #[serde(default)]
    pub send_name: bool,
    #[serde(default)]
    pub send_photo: bool,
}

/// Parameters for `send_message`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams<'a> {
    pub receiver: &'a str,
    pub sender: &'a Sender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<&'a str>,
    #[serde(flatten)]
    pub message: &'a Message,
}

/// Parameters for `post` (public chat).
#[derive(Debug, Clone, Serialize)]
pub struct PostParams<'a> {
    pub from: &'a str,
    pub sender: &'a Sender,
    #[serde(flatten)]
    pub message: &'a Message,
}

/// Parameters for `get_user_details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserDetailsParams {
    pub id: String,
}

/// Parameters for `get_online`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOnlineParams {
    pub ids: Vec<String>,
}

/// The body returned inline for a `conversation_started` callback.
#[derive(Debug, Clone, Serialize)]
pub struct WelcomeMessage<'a> {
    pub sender: &'a Sender,
    #[serde(flatten)]
    pub message: &'a Message,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Document;
    use serde_json::json;

    #[test]
    fn test_send_message_params() {
        let sender = Sender::new("Echo", "");
        let message = Message::text("hi").with_tracking_data(Document::new().with("a", 1));
        let params = SendMessageParams {
            receiver: "01234567890A=",
            sender: &sender,
            chat_id: None,
            message: &message,
        };

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "receiver": "01234567890A=",
                "sender": {"name": "Echo"},
                "type": "text",
                "text": "hi",
                "tracking_data": "{\"a\":1}",
                "min_api_version": 1
            })
        );
    }

    #[test]
    fn test_set_webhook_params() {
        let params = SetWebhookParams {
            url: "https://example.com/viber".into(),
            is_inline: true,
            event_types: Some(vec![CallbackType::Delivered, CallbackType::Failed]),
            send_name: true,
            send_photo: true,
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["event_types"], json!(["delivered", "failed"]));
        assert_eq!(value["is_inline"], json!(true));
    }
}
