//! Webhook HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use viber_core::{CallbackError, SIGNATURE_HEADER, TransportError, TransportResult};

use super::signature::verify_signature;
use crate::caller::BoxedWebhookHandler;

/// Shared state for the webhook route.
struct WebhookState {
    /// Key for content signatures.
    auth_token: String,
    /// Receiver of verified callbacks.
    handler: BoxedWebhookHandler,
}

/// Builds a router that accepts webhook callbacks on `path`.
///
/// Requests without a valid `X-Viber-Content-Signature` are rejected (400 if
/// missing, 403 if wrong) and reported through
/// [`WebhookHandler::on_rejected`](crate::WebhookHandler::on_rejected).
/// The router can be served on its own with [`serve`] or nested into an
/// existing axum application.
pub fn router(path: &str, auth_token: impl Into<String>, handler: BoxedWebhookHandler) -> Router {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    let state = Arc::new(WebhookState {
        auth_token: auth_token.into(),
        handler,
    });

    Router::new()
        .route(&path, post(webhook_handler))
        .with_state(state)
}

/// Webhook POST handler.
async fn webhook_handler(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    trace!(len = body.len(), "Received webhook POST");

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        let err = CallbackError::MissingSignature;
        warn!(error = %err, "Rejecting webhook request");
        state.handler.on_rejected(&err);
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    };

    if !verify_signature(&state.auth_token, &body, signature) {
        let err = CallbackError::InvalidSignature;
        warn!(error = %err, "Rejecting webhook request");
        state.handler.on_rejected(&err);
        return (StatusCode::FORBIDDEN, err.to_string()).into_response();
    }

    match state.handler.on_callback(&body).await {
        Ok(Some(reply)) => {
            debug!("Returning inline reply");
            (StatusCode::OK, Json(reply)).into_response()
        }
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!(error = %e, "Webhook callback failed");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Handle to a running webhook server.
///
/// Dropping the handle stops the server.
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Webhook server task failed");
        }
    }

    /// Waits until the server stops on its own.
    pub async fn wait(self) {
        let Self {
            shutdown_tx, task, ..
        } = self;
        if let Err(e) = task.await {
            error!(error = %e, "Webhook server task failed");
        }
        drop(shutdown_tx);
    }
}

/// Binds `addr` and serves `router` in a background task.
pub async fn serve(addr: &str, router: Router) -> TransportResult<ListenerHandle> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::ConnectionFailed {
            url: addr.to_string(),
            reason: e.to_string(),
        })?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "Webhook server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
            info!("Webhook server shutting down");
        });

        if let Err(e) = server.await {
            error!(error = %e, "Webhook server error");
        }
    });

    Ok(ListenerHandle {
        local_addr,
        shutdown_tx,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WebhookHandler;
    use crate::http::sign;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use viber_core::CallbackResult;

    const TOKEN: &str = "test-token";

    #[derive(Default)]
    struct Recorder {
        bodies: Mutex<Vec<Vec<u8>>>,
        rejected: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WebhookHandler for Recorder {
        async fn on_callback(&self, body: &[u8]) -> CallbackResult<Option<Value>> {
            self.bodies.lock().unwrap().push(body.to_vec());
            let parsed: Value = serde_json::from_slice(body)?;
            match parsed["event"].as_str() {
                Some("conversation_started") => Ok(Some(json!({"type": "text", "text": "hi"}))),
                Some(_) => Ok(None),
                None => Err(CallbackError::parse("missing event")),
            }
        }

        fn on_rejected(&self, error: &CallbackError) {
            self.rejected.lock().unwrap().push(error.to_string());
        }
    }

    fn request(body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/viber/webhook");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_signed_callback_is_delivered() {
        let recorder = Arc::new(Recorder::default());
        let app = router("viber/webhook", TOKEN, recorder.clone());

        let body = r#"{"event":"delivered","user_id":"u","timestamp":1}"#;
        let response = app
            .oneshot(request(body, Some(sign(TOKEN, body.as_bytes()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(recorder.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inline_reply_is_returned() {
        let recorder = Arc::new(Recorder::default());
        let app = router("/viber/webhook", TOKEN, recorder);

        let body = r#"{"event":"conversation_started"}"#;
        let response = app
            .oneshot(request(body, Some(sign(TOKEN, body.as_bytes()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let reply: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(reply["text"], "hi");
    }

    #[tokio::test]
    async fn test_bad_signatures_are_rejected() {
        let recorder = Arc::new(Recorder::default());
        let app = router("/viber/webhook", TOKEN, recorder.clone());
        let body = r#"{"event":"seen"}"#;

        let missing = app.clone().oneshot(request(body, None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let forged = app
            .oneshot(request(body, Some(sign("wrong", body.as_bytes()))))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::FORBIDDEN);

        assert!(recorder.bodies.lock().unwrap().is_empty());
        assert_eq!(
            *recorder.rejected.lock().unwrap(),
            vec![
                "missing content signature".to_string(),
                "content signature mismatch".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_handler_error_is_bad_request() {
        let recorder = Arc::new(Recorder::default());
        let app = router("/viber/webhook", TOKEN, recorder);

        let body = r#"{"no_event":true}"#;
        let response = app
            .oneshot(request(body, Some(sign(TOKEN, body.as_bytes()))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let recorder = Arc::new(Recorder::default());
        let handle = serve("127.0.0.1:0", router("/hook", TOKEN, recorder))
            .await
            .unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.shutdown().await;
    }
}
