//! The bot: outbound API operations and handler registration.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use viber_core::{
    AccountInfo, ApiError, ApiResponse, ApiResult, BotError, Document, EventKind, GetOnlineParams,
    GetUserDetailsParams, Message, PostParams, SendMessageParams, Sender, SetWebhookParams,
    TransportResult, User, UserDetails, UserProfile, UserStatus, endpoint,
};
use viber_transport::{BoxedApiCaller, HttpApiCaller, ListenerHandle};

use crate::config::{BotConfiguration, WebhookConfig};
use crate::dispatch::WebhookEndpoint;
use crate::handler::{ConversationFinish, Handler, HandlerRegistry, HandlerResult, Subscription};
use crate::logging;
use crate::response::Response;

/// A Viber bot account.
///
/// Cloning is cheap; clones share handlers and the API client.
///
/// ```rust,ignore
/// use viber_bot::{Bot, BotConfiguration, Message};
///
/// let bot = Bot::new(BotConfiguration::new(token, "Echo", ""))?;
/// let _ = bot.on_text_message(Regex::new(".*")?, |message, response| async move {
///     response.send(message, None).await?;
///     Ok(())
/// });
/// ```
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

struct BotInner {
    config: BotConfiguration,
    sender: Sender,
    api: BoxedApiCaller,
    handlers: Arc<HandlerRegistry>,
}

impl Bot {
    /// Creates a bot talking to the configured API URL over HTTP.
    ///
    /// Installs the configured logger, if any.
    pub fn new(config: BotConfiguration) -> ApiResult<Self> {
        if let Some(logger) = &config.logger {
            logging::init_from_config(logger);
        }

        let caller =
            HttpApiCaller::with_timeout(&config.api_url, &config.auth_token, config.timeout())?;
        Ok(Self::with_caller(config, Arc::new(caller)))
    }

    /// Creates a bot on top of a custom [`ApiCaller`](viber_transport::ApiCaller).
    pub fn with_caller(config: BotConfiguration, api: BoxedApiCaller) -> Self {
        let sender = Sender::new(&config.name, &config.avatar);
        Self {
            inner: Arc::new(BotInner {
                config,
                sender,
                api,
                handlers: Arc::new(HandlerRegistry::default()),
            }),
        }
    }

    pub fn configuration(&self) -> &BotConfiguration {
        &self.inner.config
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn avatar(&self) -> &str {
        &self.inner.config.avatar
    }

    /// The sender attached to every outgoing message.
    pub fn sender(&self) -> &Sender {
        &self.inner.sender
    }

    pub(crate) fn handlers(&self) -> &HandlerRegistry {
        &self.inner.handlers
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner.handlers.count(kind)
    }

    // =========================================================================
    // REST API
    // =========================================================================

    /// Posts `body` to `endpoint` and decodes a successful response.
    async fn request<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> ApiResult<T> {
        debug!(endpoint, "Calling API");
        let value = self.inner.api.call(endpoint, body).await?;

        let envelope: ApiResponse = serde_json::from_value(value.clone())?;
        if let Err(e) = envelope.check() {
            warn!(
                endpoint,
                status = %envelope.status,
                message = %envelope.status_message,
                "API call rejected"
            );
            return Err(e);
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Fetches the bot's own account details.
    pub async fn get_bot_profile(&self) -> ApiResult<AccountInfo> {
        self.request(endpoint::GET_ACCOUNT_INFO, json!({})).await
    }

    /// Fetches the details of a subscribed user.
    pub async fn get_user_details(&self, user: &UserProfile) -> ApiResult<User> {
        let body = serde_json::to_value(GetUserDetailsParams {
            id: user.id.clone(),
        })?;
        let details: UserDetails = self.request(endpoint::GET_USER_DETAILS, body).await?;
        Ok(details.user)
    }

    /// Fetches the online status of several users.
    pub async fn get_online_status<S: AsRef<str>>(&self, ids: &[S]) -> ApiResult<UserStatus> {
        let body = serde_json::to_value(GetOnlineParams {
            ids: ids.iter().map(|id| id.as_ref().to_string()).collect(),
        })?;
        self.request(endpoint::GET_ONLINE, body).await
    }

    /// Registers `url` as the account's webhook.
    ///
    /// The platform immediately posts a signed `webhook` callback to `url`,
    /// so the webhook server must already be listening.
    pub async fn set_webhook(&self, url: &str, is_inline: bool) -> ApiResult<ApiResponse> {
        let body = serde_json::to_value(SetWebhookParams {
            url: url.to_string(),
            is_inline,
            event_types: self.inner.config.register_to_events.clone(),
            send_name: true,
            send_photo: true,
        })?;

        let response: ApiResponse = self.request(endpoint::SET_WEBHOOK, body).await?;
        info!(url, event_types = ?response.event_types, "Webhook registered");
        Ok(response)
    }

    /// Sends messages to a user, one request per message and in order.
    ///
    /// All messages are validated before the first is sent. A `tracking_data`
    /// document replaces each message's own. Sending stops at the first
    /// failure; otherwise the response to the last message is returned. Every
    /// delivered message is passed to the `message_sent` handlers.
    pub async fn send_message(
        &self,
        user: &UserProfile,
        messages: impl IntoIterator<Item = Message>,
        tracking_data: Option<&Document>,
        chat_id: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let messages = prepare(messages)?;
        let mut last = ApiResponse::default();

        for mut message in messages {
            if let Some(tracking_data) = tracking_data {
                message.options.tracking_data = Some(tracking_data.clone());
            }

            let body = serde_json::to_value(SendMessageParams {
                receiver: &user.id,
                sender: &self.inner.sender,
                chat_id,
                message: &message,
            })?;

            last = self.request(endpoint::SEND_MESSAGE, body).await?;
            debug!(
                receiver = %user.id,
                message_token = ?last.message_token,
                "Message sent"
            );

            self.emit_message_sent(message, user.clone()).await;
        }

        Ok(last)
    }

    /// Posts messages to the bot's public chat on behalf of an account member.
    pub async fn post_to_public_chat(
        &self,
        from: &UserProfile,
        messages: impl IntoIterator<Item = Message>,
    ) -> ApiResult<ApiResponse> {
        let messages = prepare(messages)?;
        let mut last = ApiResponse::default();

        for message in &messages {
            let body = serde_json::to_value(PostParams {
                from: &from.id,
                sender: &self.inner.sender,
                message,
            })?;
            last = self.request(endpoint::POST, body).await?;
        }

        debug!(from = %from.id, count = messages.len(), "Posted to public chat");
        Ok(last)
    }

    // =========================================================================
    // Webhook
    // =========================================================================

    /// An axum router accepting webhook callbacks on `/`.
    ///
    /// Nest it wherever the webhook should live:
    ///
    /// ```rust,ignore
    /// let app = axum::Router::new().nest("/viber/webhook", bot.middleware());
    /// ```
    pub fn middleware(&self) -> axum::Router {
        self.webhook_router("/")
    }

    /// An axum router accepting webhook callbacks on `path`.
    pub fn webhook_router(&self, path: &str) -> axum::Router {
        viber_transport::router(
            path,
            self.inner.config.auth_token.clone(),
            Arc::new(WebhookEndpoint::new(self.clone())),
        )
    }

    /// Serves the webhook on the configured address and path.
    pub async fn listen(&self, webhook: &WebhookConfig) -> TransportResult<ListenerHandle> {
        viber_transport::serve(&webhook.listen_addr(), self.webhook_router(&webhook.path)).await
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn register(&self, handler: Handler) -> Subscription {
        self.inner.handlers.register(handler)
    }

    /// Runs `handler` for every received message.
    pub fn on_message<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(Message, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::Message(Arc::new(move |message, response| {
            handler(message, response).boxed()
        })))
    }

    /// Runs `handler` for text messages matching `pattern`.
    pub fn on_text_message<F, Fut>(&self, pattern: Regex, handler: F) -> Subscription
    where
        F: Fn(Message, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::Text(
            pattern,
            Arc::new(move |message, response| handler(message, response).boxed()),
        ))
    }

    /// Runs `handler` for every message the bot delivered.
    pub fn on_message_sent<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(Message, UserProfile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::MessageSent(Arc::new(move |message, user| {
            handler(message, user).boxed()
        })))
    }

    /// Runs `handler` for processing errors.
    ///
    /// Without any error handler, errors are logged.
    pub fn on_error<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(BotError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(Handler::Error(Arc::new(move |error| handler(error).boxed())))
    }

    /// Runs `handler` when a user opens a conversation.
    ///
    /// The handler receives the user, whether they are subscribed, the
    /// deep-link context and a [`ConversationFinish`] to answer with.
    pub fn on_conversation_started<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(UserProfile, bool, Option<String>, ConversationFinish) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::ConversationStarted(Arc::new(
            move |user, subscribed, context, finish| {
                handler(user, subscribed, context, finish).boxed()
            },
        )))
    }

    /// Runs `handler` when a user subscribes.
    pub fn on_subscribe<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::Subscribed(Arc::new(move |response| {
            handler(response).boxed()
        })))
    }

    /// Runs `handler` with the user id when a user unsubscribes.
    pub fn on_unsubscribe<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::Unsubscribed(Arc::new(move |user_id| {
            handler(user_id).boxed()
        })))
    }

    /// Runs `handler` with the user id and description of a failed delivery.
    pub fn on_failed<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Handler::Failed(Arc::new(move |user_id, desc| {
            handler(user_id, desc).boxed()
        })))
    }

    async fn emit_message_sent(&self, message: Message, user: UserProfile) {
        let handlers = self.handlers().select(|h| match h {
            Handler::MessageSent(f) => Some(f.clone()),
            _ => None,
        });
        for handler in handlers {
            self.run_handler(handler(message.clone(), user.clone())).await;
        }
    }
}

/// Collects and validates an outgoing batch.
fn prepare(messages: impl IntoIterator<Item = Message>) -> ApiResult<Vec<Message>> {
    let messages: Vec<Message> = messages.into_iter().collect();
    if messages.is_empty() {
        return Err(ApiError::invalid_message("no messages to send"));
    }
    for message in &messages {
        message.validate()?;
    }
    Ok(messages)
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("name", &self.inner.config.name)
            .field("api_url", &self.inner.config.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use viber_core::StatusCode;
    use viber_transport::ApiCaller;

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl ApiCaller for FakeApi {
        async fn call(&self, endpoint: &str, body: Value) -> ApiResult<Value> {
            self.calls.lock().push((endpoint.to_string(), body));
            Ok(match endpoint {
                endpoint::GET_USER_DETAILS => json!({
                    "status": 0,
                    "status_message": "ok",
                    "user": {"id": "01234567890A=", "name": "John", "device_type": "iPhone9,4"}
                }),
                endpoint::GET_ACCOUNT_INFO => json!({"status": 2, "status_message": "invalidAuthToken"}),
                endpoint::GET_ONLINE => json!({
                    "status": 0,
                    "status_message": "ok",
                    "users": [
                        {"id": "a", "online_status": 0, "online_status_message": "online"},
                        {"id": "b", "online_status": 1, "online_status_message": "offline", "last_online": 1457764197627_i64}
                    ]
                }),
                _ => json!({"status": 0, "status_message": "ok", "message_token": 1}),
            })
        }
    }

    fn bot() -> (Bot, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::default());
        let config = BotConfiguration::new("token", "Echo", "https://example.com/a.png");
        (Bot::with_caller(config, api.clone()), api)
    }

    #[tokio::test]
    async fn test_get_user_details_returns_user() {
        let (bot, api) = bot();
        let user = bot
            .get_user_details(&UserProfile::from_id("01234567890A="))
            .await
            .unwrap();

        assert_eq!(user.device_type, "iPhone9,4");
        assert_eq!(user.name, "John");
        assert_eq!(api.calls.lock()[0].1, json!({"id": "01234567890A="}));
    }

    #[tokio::test]
    async fn test_status_error_is_returned() {
        let (bot, _) = bot();
        let err = bot.get_bot_profile().await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::InvalidAuthToken));
    }

    #[tokio::test]
    async fn test_get_online_status() {
        let (bot, api) = bot();
        let status = tokio_test::assert_ok!(bot.get_online_status(&["a", "b"]).await);

        assert!(status.is_ok());
        assert_eq!(status.users.len(), 2);
        assert_eq!(status.users[1].last_online, Some(1457764197627));
        assert_eq!(api.calls.lock()[0].1, json!({"ids": ["a", "b"]}));
    }

    #[tokio::test]
    async fn test_set_webhook_body() {
        let (bot, api) = bot();
        bot.set_webhook("https://example.com/hook", true).await.unwrap();

        let (endpoint, body) = api.calls.lock()[0].clone();
        assert_eq!(endpoint, "set_webhook");
        assert_eq!(body["url"], "https://example.com/hook");
        assert_eq!(body["is_inline"], true);
        assert!(body.get("event_types").is_none());
    }

    #[tokio::test]
    async fn test_post_to_public_chat_uses_from() {
        let (bot, api) = bot();
        bot.post_to_public_chat(&UserProfile::from_id("admin"), Message::text("news"))
            .await
            .unwrap();

        let (endpoint, body) = api.calls.lock()[0].clone();
        assert_eq!(endpoint, "post");
        assert_eq!(body["from"], "admin");
        assert_eq!(body["sender"]["avatar"], "https://example.com/a.png");
        assert_eq!(body["text"], "news");
    }

    #[tokio::test]
    async fn test_invalid_batch_sends_nothing() {
        let (bot, api) = bot();
        let user = UserProfile::from_id("u");

        let err = bot
            .send_message(&user, Vec::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidMessage(_)));

        let batch = vec![Message::text("ok"), Message::text("")];
        assert!(bot.send_message(&user, batch, None, None).await.is_err());
        assert!(api.calls.lock().is_empty());
    }
}
