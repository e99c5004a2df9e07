//! Callback dispatch.
//!
//! Turns parsed webhook callbacks into handler invocations:
//!
//! | Callback | Handlers |
//! |----------|----------|
//! | `message` | `on_message`, then matching `on_text_message` |
//! | `subscribed` | `on_subscribe` |
//! | `unsubscribed` | `on_unsubscribe` |
//! | `conversation_started` | `on_conversation_started`, reply returned inline |
//! | `failed` | `on_failed` |
//! | `webhook`, `delivered`, `seen`, `client_status` | logged only |
//!
//! Handler errors and unparsable bodies go to the `on_error` handlers.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, debug_span, error, info, warn};
use viber_core::{
    ApiError, BotError, Callback, CallbackError, CallbackResult, ConversationStartedCallback,
    MessageCallback, MessageKind, WelcomeMessage,
};
use viber_transport::WebhookHandler;

use crate::bot::Bot;
use crate::handler::{ConversationFinish, ConversationReply, Handler, HandlerResult};
use crate::response::Response;

impl Bot {
    /// Parses and dispatches one webhook body, waiting for all handlers.
    ///
    /// Returns the inline reply for `conversation_started`, if a handler
    /// supplied one.
    pub async fn handle_callback(&self, body: &[u8]) -> CallbackResult<Option<Value>> {
        let callback = self.parse_callback(body).await?;
        Ok(self.dispatch(callback).await)
    }

    async fn parse_callback(&self, body: &[u8]) -> CallbackResult<Callback> {
        match Callback::parse(body) {
            Ok(callback) => Ok(callback),
            Err(e) => {
                self.report_error(e.clone().into()).await;
                Err(e)
            }
        }
    }

    pub(crate) async fn dispatch(&self, callback: Callback) -> Option<Value> {
        let span = debug_span!("callback", event = %callback.callback_type());

        async move {
            match callback {
                Callback::Webhook(cb) => {
                    info!(timestamp = cb.timestamp, "Webhook confirmed by the platform");
                    None
                }
                Callback::Message(cb) => {
                    self.dispatch_message(cb).await;
                    None
                }
                Callback::Subscribed(cb) => {
                    debug!(user = %cb.user.id, "User subscribed");
                    let response = Response::new(self.clone(), cb.user);
                    let handlers = self.handlers().select(|h| match h {
                        Handler::Subscribed(f) => Some(f.clone()),
                        _ => None,
                    });
                    for handler in handlers {
                        self.run_handler(handler(response.clone())).await;
                    }
                    None
                }
                Callback::Unsubscribed(cb) => {
                    debug!(user_id = %cb.user_id, "User unsubscribed");
                    let handlers = self.handlers().select(|h| match h {
                        Handler::Unsubscribed(f) => Some(f.clone()),
                        _ => None,
                    });
                    for handler in handlers {
                        self.run_handler(handler(cb.user_id.clone())).await;
                    }
                    None
                }
                Callback::ConversationStarted(cb) => self.dispatch_conversation_started(cb).await,
                Callback::Failed(cb) => {
                    warn!(user_id = %cb.user_id, desc = %cb.desc, "Message delivery failed");
                    let handlers = self.handlers().select(|h| match h {
                        Handler::Failed(f) => Some(f.clone()),
                        _ => None,
                    });
                    for handler in handlers {
                        self.run_handler(handler(cb.user_id.clone(), cb.desc.clone()))
                            .await;
                    }
                    None
                }
                Callback::Delivered(cb) => {
                    debug!(user_id = %cb.user_id, message_token = ?cb.message_token, "Message delivered");
                    None
                }
                Callback::Seen(cb) => {
                    debug!(user_id = %cb.user_id, message_token = ?cb.message_token, "Message seen");
                    None
                }
                Callback::ClientStatus(cb) => {
                    debug!(timestamp = cb.timestamp, "Client status changed");
                    None
                }
                Callback::Unknown => {
                    debug!("Ignoring unknown callback");
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch_message(&self, cb: MessageCallback) {
        let MessageCallback {
            sender,
            message,
            silent,
            reply_type,
            chat_id,
            ..
        } = cb;

        debug!(
            sender = %sender.id,
            kind = message.type_name().unwrap_or("keyboard"),
            "Message received"
        );

        let response = Response::new(self.clone(), sender).with_context(silent, reply_type, chat_id);

        let on_message = self.handlers().select(|h| match h {
            Handler::Message(f) => Some(f.clone()),
            _ => None,
        });
        let on_text = match &message.kind {
            MessageKind::Text(text) => self.handlers().select(|h| match h {
                Handler::Text(pattern, f) if pattern.is_match(&text.text) => Some(f.clone()),
                _ => None,
            }),
            _ => Vec::new(),
        };

        for handler in on_message.into_iter().chain(on_text) {
            self.run_handler(handler(message.clone(), response.clone()))
                .await;
        }
    }

    /// Runs the conversation handlers concurrently and returns the reply of
    /// the earliest registered handler that supplies one.
    ///
    /// A reply is used as soon as every handler registered before it has
    /// declined. At the deadline the earliest reply received so far wins.
    async fn dispatch_conversation_started(
        &self,
        cb: ConversationStartedCallback,
    ) -> Option<Value> {
        debug!(
            user = %cb.user.id,
            subscribed = cb.subscribed,
            context = ?cb.context,
            "Conversation started"
        );

        let handlers = self.handlers().select(|h| match h {
            Handler::ConversationStarted(f) => Some(f.clone()),
            _ => None,
        });
        if handlers.is_empty() {
            return None;
        }

        let deadline = Instant::now() + self.configuration().conversation_reply_timeout();
        let mut slots: Vec<Slot> = Vec::with_capacity(handlers.len());
        let mut pending = FuturesUnordered::new();

        for (index, handler) in handlers.into_iter().enumerate() {
            let (finish, rx) = ConversationFinish::channel();
            let run = handler(cb.user.clone(), cb.subscribed, cb.context.clone(), finish);
            let bot = self.clone();
            tokio::spawn(async move { bot.run_handler(run).await }.in_current_span());
            slots.push(Slot::Pending);
            // A dropped finisher counts as done()
            pending.push(rx.map(move |reply| (index, reply.ok().flatten())));
        }

        loop {
            // The earliest handler that has not declined decides.
            match slots.iter().find(|slot| !matches!(slot, Slot::Done)) {
                None => return None,
                Some(Slot::Replied(_)) => break,
                Some(_) => {}
            }

            match timeout_at(deadline, pending.next()).await {
                Ok(Some((index, Some(reply)))) => slots[index] = Slot::Replied(reply),
                Ok(Some((index, None))) => slots[index] = Slot::Done,
                Ok(None) => break,
                Err(_) => {
                    warn!(user = %cb.user.id, "Timed out waiting for earlier conversation handlers");
                    break;
                }
            }
        }

        let reply = slots.into_iter().find_map(|slot| match slot {
            Slot::Replied(reply) => Some(reply),
            _ => None,
        });
        match reply {
            Some(reply) => self.welcome_body(reply).await,
            None => {
                debug!(user = %cb.user.id, "No welcome message supplied");
                None
            }
        }
    }

    async fn welcome_body(&self, reply: ConversationReply) -> Option<Value> {
        let ConversationReply {
            mut message,
            tracking_data,
        } = reply;

        if tracking_data.is_some() {
            message.options.tracking_data = tracking_data;
        }

        let body = message.validate().and_then(|()| {
            serde_json::to_value(WelcomeMessage {
                sender: self.sender(),
                message: &message,
            })
            .map_err(ApiError::from)
        });

        match body {
            Ok(body) => Some(body),
            Err(e) => {
                self.report_error(e.into()).await;
                None
            }
        }
    }

    pub(crate) async fn run_handler(&self, run: BoxFuture<'static, HandlerResult>) {
        if let Err(e) = run.await {
            self.report_error(e).await;
        }
    }

    /// Passes `error` to every error handler, or logs it if there is none.
    pub(crate) async fn report_error(&self, error: BotError) {
        let handlers = self.handlers().select(|h| match h {
            Handler::Error(f) => Some(f.clone()),
            _ => None,
        });

        if handlers.is_empty() {
            error!(error = %error, "Unhandled bot error");
            return;
        }

        for handler in handlers {
            handler(error.clone()).await;
        }
    }
}

/// State of one conversation handler while waiting for replies.
enum Slot {
    Pending,
    Done,
    Replied(ConversationReply),
}

/// The bot as seen by the webhook router.
///
/// `conversation_started` is dispatched before answering so the welcome
/// message can go inline. Everything else is acknowledged at once and
/// dispatched in the background.
pub(crate) struct WebhookEndpoint {
    bot: Bot,
}

impl WebhookEndpoint {
    pub(crate) fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl WebhookHandler for WebhookEndpoint {
    async fn on_callback(&self, body: &[u8]) -> CallbackResult<Option<Value>> {
        let callback = self.bot.parse_callback(body).await?;

        if matches!(callback, Callback::ConversationStarted(_)) {
            return Ok(self.bot.dispatch(callback).await);
        }

        let bot = self.bot.clone();
        tokio::spawn(async move {
            bot.dispatch(callback).await;
        });
        Ok(None)
    }

    fn on_rejected(&self, error: &CallbackError) {
        let bot = self.bot.clone();
        let error = BotError::from(error.clone());
        tokio::spawn(async move { bot.report_error(error).await });
    }
}
