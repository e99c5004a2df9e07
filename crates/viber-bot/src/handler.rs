//! Handler registry and subscription handles.
//!
//! Handlers are stored per [`EventKind`] in registration order. Each
//! registration returns a [`Subscription`]; calling
//! [`Subscription::unsubscribe`] removes the handler before the next callback
//! is dispatched. Dropping the handle keeps the handler registered.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use regex::Regex;
use tokio::sync::oneshot;
use viber_core::{BotError, Document, EventKind, Message, UserProfile};

use crate::response::Response;

/// What a handler returns. Errors are passed to the bot's error handlers.
pub type HandlerResult = Result<(), BotError>;

pub(crate) type MessageHandler =
    Arc<dyn Fn(Message, Response) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type ResponseHandler =
    Arc<dyn Fn(Response) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type UserIdHandler =
    Arc<dyn Fn(String) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type SentHandler =
    Arc<dyn Fn(Message, UserProfile) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type ConversationHandler = Arc<
    dyn Fn(UserProfile, bool, Option<String>, ConversationFinish) -> BoxFuture<'static, HandlerResult>
        + Send
        + Sync,
>;
pub(crate) type FailedHandler =
    Arc<dyn Fn(String, String) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type ErrorHandler = Arc<dyn Fn(BotError) -> BoxFuture<'static, ()> + Send + Sync>;

/// A registered handler.
#[derive(Clone)]
pub(crate) enum Handler {
    Message(MessageHandler),
    Text(Regex, MessageHandler),
    MessageSent(SentHandler),
    Subscribed(ResponseHandler),
    Unsubscribed(UserIdHandler),
    ConversationStarted(ConversationHandler),
    Failed(FailedHandler),
    Error(ErrorHandler),
}

impl Handler {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) | Self::Text(..) => EventKind::Message,
            Self::MessageSent(_) => EventKind::MessageSent,
            Self::Subscribed(_) => EventKind::Subscribed,
            Self::Unsubscribed(_) => EventKind::Unsubscribed,
            Self::ConversationStarted(_) => EventKind::ConversationStarted,
            Self::Failed(_) => EventKind::Failed,
            Self::Error(_) => EventKind::Error,
        }
    }
}

#[derive(Default)]
pub(crate) struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(u64, Handler)>>,
}

impl HandlerRegistry {
    pub(crate) fn register(self: &Arc<Self>, handler: Handler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let kind = handler.kind();
        self.handlers.write().push((id, handler));
        tracing::trace!(id, kind = %kind, "Handler registered");

        Subscription {
            id,
            kind,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .iter()
            .filter(|(_, h)| h.kind() == kind)
            .count()
    }

    /// Snapshots the handlers selected by `pick`, in registration order.
    ///
    /// The lock is released before any handler runs, so handlers may register
    /// or unsubscribe freely.
    pub(crate) fn select<T>(&self, pick: impl Fn(&Handler) -> Option<T>) -> Vec<T> {
        self.handlers.read().iter().filter_map(|(_, h)| pick(h)).collect()
    }
}

/// Handle to a registered handler.
#[must_use = "dropping a Subscription keeps the handler registered; call unsubscribe() to remove it"]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<HandlerRegistry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The event the handler listens to.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns `true` while the handler is registered.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            registry.handlers.read().iter().any(|(id, _)| *id == self.id)
        })
    }

    /// Removes the handler.
    ///
    /// Returns `false` if it was already removed or the bot is gone.
    pub fn unsubscribe(self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id));
        tracing::trace!(id = self.id, kind = %self.kind, removed, "Handler unsubscribed");
        removed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

// =============================================================================
// Conversation replies
// =============================================================================

/// A welcome message returned inline for a `conversation_started` callback.
#[derive(Debug, Clone)]
pub struct ConversationReply {
    pub message: Message,
    pub tracking_data: Option<Document>,
}

/// Completes a `conversation_started` callback.
///
/// Call [`reply`](Self::reply) to send a welcome message in the webhook
/// response, or [`done`](Self::done) to send none. Dropping it is the same
/// as `done`.
#[derive(Debug)]
pub struct ConversationFinish {
    tx: oneshot::Sender<Option<ConversationReply>>,
}

impl ConversationFinish {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Option<ConversationReply>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Supplies the welcome message.
    pub fn reply(self, message: Message, tracking_data: Option<Document>) {
        let _ = self.tx.send(Some(ConversationReply {
            message,
            tracking_data,
        }));
    }

    /// Finishes without a welcome message.
    pub fn done(self) {
        let _ = self.tx.send(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop_failed() -> Handler {
        Handler::Failed(Arc::new(|_: String, _: String| {
            async { Ok::<_, BotError>(()) }.boxed()
        }))
    }

    #[test]
    fn test_unsubscribe_removes_only_that_handler() {
        let registry = Arc::new(HandlerRegistry::default());
        let first = registry.register(noop_failed());
        let second = registry.register(noop_failed());
        assert_eq!(registry.count(EventKind::Failed), 2);
        assert_ne!(first.id(), second.id());

        assert!(first.unsubscribe());
        assert_eq!(registry.count(EventKind::Failed), 1);
        assert!(second.is_active());
    }

    #[test]
    fn test_dropped_handle_keeps_handler() {
        let registry = Arc::new(HandlerRegistry::default());
        drop(registry.register(noop_failed()));
        assert_eq!(registry.count(EventKind::Failed), 1);
    }

    #[test]
    fn test_unsubscribe_after_registry_gone() {
        let registry = Arc::new(HandlerRegistry::default());
        let subscription = registry.register(noop_failed());
        drop(registry);
        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_text_handlers_count_as_message() {
        let registry = Arc::new(HandlerRegistry::default());
        let handler: MessageHandler =
            Arc::new(|_: Message, _: Response| async { Ok::<_, BotError>(()) }.boxed());
        let subscription =
            registry.register(Handler::Text(Regex::new("^hi").unwrap(), handler));
        assert_eq!(subscription.kind(), EventKind::Message);
        assert_eq!(registry.count(EventKind::Message), 1);
    }

    #[tokio::test]
    async fn test_finish_channel() {
        let (finish, rx) = ConversationFinish::channel();
        finish.reply(Message::text("welcome"), None);
        let reply = rx.await.unwrap().unwrap();
        assert_eq!(reply.message.text_content(), Some("welcome"));

        let (finish, rx) = ConversationFinish::channel();
        drop(finish);
        assert!(rx.await.is_err());
    }
}
