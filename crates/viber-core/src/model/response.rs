//! REST API response types.
//!
//! Every endpoint answers with the same envelope ([`ApiResponse`]). Endpoint
//! specific responses embed it by value and expose it through [`Envelope`]
//! and `Deref`:
//!
//! ```text
//! AccountInfo  ──Deref──▶  ApiResponse { status, status_message, event_types }
//! UserDetails  ──Deref──▶  ApiResponse
//! UserStatus   ──Deref──▶  ApiResponse
//! ```

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::event::CallbackType;
use super::user::User;
use crate::error::{ApiError, ApiResult};

// ============================================================================
// Status codes
// ============================================================================

/// Platform status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum StatusCode {
    #[default]
    Ok,
    InvalidUrl,
    InvalidAuthToken,
    BadData,
    MissingData,
    ReceiverNotRegistered,
    ReceiverNotSubscribed,
    AccountBlocked,
    AccountNotFound,
    AccountSuspended,
    WebhookNotSet,
    ReceiverNoSuitableDevice,
    TooManyRequests,
    ApiVersionNotSupported,
    /// Any code not listed above.
    Other(i64),
}

impl StatusCode {
    /// Returns the numeric code.
    pub fn code(&self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::InvalidUrl => 1,
            Self::InvalidAuthToken => 2,
            Self::BadData => 3,
            Self::MissingData => 4,
            Self::ReceiverNotRegistered => 5,
            Self::ReceiverNotSubscribed => 6,
            Self::AccountBlocked => 7,
            Self::AccountNotFound => 8,
            Self::AccountSuspended => 9,
            Self::WebhookNotSet => 10,
            Self::ReceiverNoSuitableDevice => 11,
            Self::TooManyRequests => 12,
            Self::ApiVersionNotSupported => 13,
            Self::Other(code) => *code,
        }
    }

    /// Returns `true` for status 0.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<i64> for StatusCode {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::InvalidUrl,
            2 => Self::InvalidAuthToken,
            3 => Self::BadData,
            4 => Self::MissingData,
            5 => Self::ReceiverNotRegistered,
            6 => Self::ReceiverNotSubscribed,
            7 => Self::AccountBlocked,
            8 => Self::AccountNotFound,
            9 => Self::AccountSuspended,
            10 => Self::WebhookNotSet,
            11 => Self::ReceiverNoSuitableDevice,
            12 => Self::TooManyRequests,
            13 => Self::ApiVersionNotSupported,
            other => Self::Other(other),
        }
    }
}

impl From<StatusCode> for i64 {
    fn from(code: StatusCode) -> Self {
        code.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// The envelope shared by every API response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Status code, 0 on success.
    pub status: StatusCode,
    /// Human-readable status.
    #[serde(default)]
    pub status_message: String,
    /// Callback types the webhook is subscribed to.
    #[serde(default)]
    pub event_types: Vec<CallbackType>,
    /// Token of the message just sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_token: Option<u64>,
    /// Host that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_hostname: Option<String>,
    /// Billing status for the sent message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_status: Option<i64>,
}

impl ApiResponse {
    /// Checks if the API call was successful.
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Converts a failed status into [`ApiError::Status`].
    pub fn check(&self) -> ApiResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(ApiError::Status {
                code: self.status,
                message: self.status_message.clone(),
            })
        }
    }
}

/// Access to the common envelope of any response type.
pub trait Envelope {
    /// Returns the envelope.
    fn envelope(&self) -> &ApiResponse;

    /// Returns `self` if the status is OK, the status error otherwise.
    fn into_result(self) -> ApiResult<Self>
    where
        Self: Sized,
    {
        self.envelope().check()?;
        Ok(self)
    }
}

impl Envelope for ApiResponse {
    fn envelope(&self) -> &ApiResponse {
        self
    }
}

macro_rules! impl_envelope {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Envelope for $ty {
                fn envelope(&self) -> &ApiResponse {
                    &self.response
                }
            }

            impl Deref for $ty {
                type Target = ApiResponse;

                fn deref(&self) -> &Self::Target {
                    &self.response
                }
            }
        )*
    };
}

impl_envelope!(AccountInfo, UserDetails, UserStatus);

// ============================================================================
// Endpoint responses
// ============================================================================

/// Geographic location of an account.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Response of `get_account_info`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(flatten)]
    pub response: ApiResponse,

    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Unique account URI.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub location: Option<AccountLocation>,
    #[serde(default)]
    pub country: String,
    /// Currently registered webhook URL.
    #[serde(default)]
    pub webhook: String,
    #[serde(default)]
    pub subscribers_count: u64,
    /// Account members (admins and participants).
    #[serde(default)]
    pub members: Vec<User>,
}

/// Response of `get_user_details`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub response: ApiResponse,

    pub user: User,
}

/// Online status of a single user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OnlineStatus {
    pub id: String,
    /// 0 online, 1 offline, 2 undisclosed, 3 internal error, 4 unavailable.
    #[serde(default)]
    pub online_status: i64,
    #[serde(default)]
    pub online_status_message: String,
    /// Epoch milliseconds of the last activity, when offline.
    #[serde(default)]
    pub last_online: Option<i64>,
}

/// Response of `get_online`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserStatus {
    #[serde(flatten)]
    pub response: ApiResponse,

    #[serde(default)]
    pub users: Vec<OnlineStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn assert_envelope_kept(value: Value) {
        for field in ["status", "status_message", "event_types"] {
            assert!(value.get(field).is_some(), "missing {field} in {value}");
        }
    }

    fn envelope() -> ApiResponse {
        ApiResponse {
            status: StatusCode::Ok,
            status_message: "ok".into(),
            event_types: vec![CallbackType::Delivered, CallbackType::Seen],
            ..Default::default()
        }
    }

    #[test]
    fn test_extensions_keep_envelope() {
        let account = AccountInfo {
            response: envelope(),
            ..Default::default()
        };
        let details = UserDetails {
            response: envelope(),
            ..Default::default()
        };
        let status = UserStatus {
            response: envelope(),
            ..Default::default()
        };

        assert_envelope_kept(serde_json::to_value(&account).unwrap());
        assert_envelope_kept(serde_json::to_value(&details).unwrap());
        assert_envelope_kept(serde_json::to_value(&status).unwrap());
        assert_eq!(account.envelope().event_types.len(), 2);
        assert!(status.is_ok());
    }

    #[test]
    fn test_empty_envelope_is_kept() {
        let account = serde_json::to_value(AccountInfo::default()).unwrap();
        assert_envelope_kept(account.clone());
        assert_eq!(account["event_types"], json!([]));

        assert_envelope_kept(serde_json::to_value(UserDetails::default()).unwrap());
        assert_envelope_kept(serde_json::to_value(UserStatus::default()).unwrap());
    }

    #[test]
    fn test_account_info_parses() {
        let info: AccountInfo = serde_json::from_value(json!({
            "status": 0,
            "status_message": "ok",
            "id": "pa:75346594275468546724",
            "name": "account name",
            "uri": "accountUri",
            "icon": "http://example.com",
            "background": "http://example.com",
            "category": "category",
            "subcategory": "sub category",
            "location": {"lon": 0.1, "lat": 0.2},
            "country": "UK",
            "webhook": "https://my.site.com",
            "event_types": ["delivered", "seen"],
            "subscribers_count": 35,
            "members": [{"id": "01234567890A=", "name": "my name", "role": "admin"}]
        }))
        .unwrap();

        assert_eq!(info.uri, "accountUri");
        assert_eq!(info.location, Some(AccountLocation { lat: 0.2, lon: 0.1 }));
        assert_eq!(info.members[0].role, "admin");
        assert_eq!(info.event_types, vec![CallbackType::Delivered, CallbackType::Seen]);
    }

    #[test]
    fn test_status_error() {
        let response: ApiResponse = serde_json::from_value(json!({
            "status": 2,
            "status_message": "invalidAuthToken"
        }))
        .unwrap();

        let err = response.into_result().unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::InvalidAuthToken));
        assert_eq!(StatusCode::from(99), StatusCode::Other(99));
        assert_eq!(i64::from(StatusCode::TooManyRequests), 12);
    }
}
