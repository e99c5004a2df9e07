//! Unified error types for the Viber SDK.
//!
//! Outbound calls fail with [`ApiError`], inbound webhook processing fails with
//! [`CallbackError`]. Both are folded into [`BotError`], which is what error
//! handlers registered on a bot receive.

use thiserror::Error;

use crate::model::StatusCode;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while talking HTTP to the platform.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The platform answered with a non-success HTTP status.
    #[error("HTTP {status} error: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for REST API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The platform returned a non-zero status.
    #[error("API error ({code}): {message}")]
    Status { code: StatusCode, message: String },
    /// A message failed validation before it was sent.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The API call timed out.
    #[error("API call timed out")]
    Timeout,
    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Creates an invalid-message error.
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    /// Returns the platform status code if this is a status error.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Callback Errors
// =============================================================================

/// Errors raised while processing an inbound webhook callback.
#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    /// The callback body could not be parsed.
    #[error("failed to parse callback: {reason}")]
    Parse {
        /// Reason for failure.
        reason: String,
    },

    /// The request carried no content signature.
    #[error("missing content signature")]
    MissingSignature,

    /// The content signature did not match the body.
    #[error("content signature mismatch")]
    InvalidSignature,

    /// A registered handler reported a failure.
    #[error("handler error: {0}")]
    Handler(String),
}

impl CallbackError {
    /// Creates a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse { reason: msg.into() }
    }

    /// Creates a handler error.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}

impl From<serde_json::Error> for CallbackError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

// =============================================================================
// Bot Errors
// =============================================================================

/// The error delivered to `on_error` handlers.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// An outbound call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An inbound callback could not be processed.
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for callback processing.
pub type CallbackResult<T> = Result<T, CallbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            code: StatusCode::ReceiverNotSubscribed,
            message: "notSubscribed".into(),
        };
        assert_eq!(err.to_string(), "API error (6): notSubscribed");
        assert_eq!(err.status_code(), Some(StatusCode::ReceiverNotSubscribed));
    }

    #[test]
    fn test_bot_error_is_transparent() {
        let err: BotError = CallbackError::InvalidSignature.into();
        assert_eq!(err.to_string(), "content signature mismatch");

        let err: BotError = ApiError::from(TransportError::Io("reset".into())).into();
        assert_eq!(err.to_string(), "I/O error: reset");
    }
}
