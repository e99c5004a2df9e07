//! HTTP client for the Viber REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tracing::{debug, trace};

use viber_core::{AUTH_TOKEN_HEADER, ApiError, ApiResult, TransportError, TransportResult};

use crate::caller::ApiCaller;

/// [`ApiCaller`] that posts JSON to the platform over HTTPS.
///
/// Every request carries the account's auth token in the
/// `X-Viber-Auth-Token` header.
pub struct HttpApiCaller {
    client: Client,
    base_url: String,
    auth_token: String,
}

impl HttpApiCaller {
    /// Creates a caller with a 30 second timeout.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> TransportResult<Self> {
        Self::with_timeout(base_url, auth_token, Duration::from_secs(30))
    }

    /// Creates a caller with a custom timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("HTTP client: {e}")))?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            auth_token: auth_token.into(),
        })
    }

    /// Returns the base URL, always ending with `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiCaller for HttpApiCaller {
    async fn call(&self, endpoint: &str, body: Value) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint = %endpoint, "Calling Viber API");
        trace!(request = %body, "API request");

        let resp = self
            .client
            .post(&url)
            .header(AUTH_TOKEN_HEADER, &self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else if e.is_connect() {
                    TransportError::ConnectionFailed {
                        url: url.clone(),
                        reason: e.to_string(),
                    }
                    .into()
                } else {
                    TransportError::Io(e.to_string()).into()
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let response: Value = resp
            .json()
            .await
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        trace!(response = %response, "API response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::json;

    async fn spawn_fake_api() -> String {
        async fn account_info(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let token = headers
                .get(AUTH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({"status": 0, "status_message": "ok", "token": token, "echo": body}))
        }

        let app = Router::new()
            .route("/pa/get_account_info", post(account_info))
            .route(
                "/pa/broken",
                post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/pa")
    }

    #[tokio::test]
    async fn test_call_sends_token_and_body() {
        let base = spawn_fake_api().await;
        let caller = HttpApiCaller::new(base, "secret-token").unwrap();
        assert!(caller.base_url().ends_with("/pa/"));

        let response = caller
            .call("get_account_info", json!({"probe": 1}))
            .await
            .unwrap();

        assert_eq!(response["token"], "secret-token");
        assert_eq!(response["echo"], json!({"probe": 1}));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let base = spawn_fake_api().await;
        let caller = HttpApiCaller::new(base, "t").unwrap();

        let err = caller.call("broken", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport(TransportError::Http { status: 502, ref body }) if body == "upstream down"
        ));
    }
}
