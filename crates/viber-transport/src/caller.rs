//! Transport-agnostic seams between the bot and the network.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use viber_core::{ApiResult, CallbackError, CallbackResult};

// =============================================================================
// ApiCaller trait: outbound REST calls
// =============================================================================

/// Outbound API call mechanism.
///
/// Decouples how a request reaches the platform from the bot logic. The
/// production implementation is [`HttpApiCaller`](crate::HttpApiCaller);
/// tests substitute recording doubles.
#[async_trait]
pub trait ApiCaller: Send + Sync {
    /// Posts `body` to `endpoint` and returns the decoded JSON response.
    ///
    /// # Arguments
    /// * `endpoint` – Endpoint name relative to the API base (e.g. `"send_message"`).
    /// * `body` – JSON request body.
    ///
    /// # Errors
    /// Returns an [`ApiError`](viber_core::ApiError) if the request cannot be
    /// delivered or the response cannot be decoded. A non-zero `status` in
    /// the decoded body is **not** an error at this layer.
    async fn call(&self, endpoint: &str, body: Value) -> ApiResult<Value>;
}

/// Shared [`ApiCaller`].
pub type BoxedApiCaller = Arc<dyn ApiCaller>;

// =============================================================================
// WebhookHandler trait: inbound callbacks
// =============================================================================

/// Receives verified webhook callbacks.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Processes a callback body whose signature has been verified.
    ///
    /// `Ok(Some(json))` is returned to the platform as the response body
    /// (inline replies), `Ok(None)` yields an empty 200.
    async fn on_callback(&self, body: &[u8]) -> CallbackResult<Option<Value>>;

    /// Called when a request is rejected before reaching
    /// [`on_callback`](WebhookHandler::on_callback).
    ///
    /// The default implementation is a no-op.
    fn on_rejected(&self, _error: &CallbackError) {}
}

/// Shared [`WebhookHandler`].
pub type BoxedWebhookHandler = Arc<dyn WebhookHandler>;
