//! # Viber Bot
//!
//! The bot runtime of the Viber SDK: a [`Bot`] that calls the REST API,
//! receives webhook callbacks and dispatches them to registered handlers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Bot                             │
//! │  ┌──────────────┐  ┌────────────────┐  ┌─────────────┐  │
//! │  │ REST API     │  │ HandlerRegistry│  │ Webhook     │  │
//! │  │ (ApiCaller)  │  │ (Subscription) │  │ (axum)      │  │
//! │  └──────────────┘  └────────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `on_*` registration returns a [`Subscription`]. Handlers return a
//! [`HandlerResult`]; errors are delivered to the `on_error` handlers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use regex::Regex;
//! use viber_bot::{Bot, config::load_config};
//!
//! let config = load_config()?;
//! let bot = Bot::new(config.bot.clone())?;
//!
//! let _ = bot.on_text_message(Regex::new(".*")?, |message, response| async move {
//!     response.send(message, None).await?;
//!     Ok(())
//! });
//!
//! let listener = bot.listen(&config.webhook).await?;
//! bot.set_webhook("https://example.com/viber/webhook", false).await?;
//! listener.wait().await;
//! ```

pub mod bot;
pub mod config;
mod dispatch;
pub mod handler;
pub mod logging;
pub mod response;

pub use bot::Bot;
pub use config::{BotConfiguration, ViberConfig};
pub use handler::{ConversationFinish, ConversationReply, HandlerResult, Subscription};
pub use response::Response;

pub use viber_core::*;
pub use viber_transport::ListenerHandle;

/// Re-exported for [`Bot::on_text_message`] patterns.
pub use regex;
