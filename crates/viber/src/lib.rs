//! # Viber
//!
//! A type-safe SDK for building Viber bots.
//!
//! ## Overview
//!
//! A bot talks to the platform in two directions: it calls the REST API
//! (send messages, register the webhook, look up users) and it receives
//! signed webhook callbacks (messages, subscriptions, conversations). This
//! crate bundles both behind one [`Bot`](prelude::Bot).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  callbacks   ┌─────────────────┐  handlers  ┌──────────────┐
//! │   Platform   │─────────────▶│ webhook router  │───────────▶│ on_message   │
//! │              │              │ (signature)     │            │ on_subscribe │
//! │              │◀─────────────│ Bot             │◀───────────│ Response     │
//! └──────────────┘   REST API   └─────────────────┘   replies  └──────────────┘
//! ```
//!
//! - **core**: messages, users, responses, errors
//! - **transport**: the HTTP client and the webhook server
//! - **bot**: handler registration, dispatch, configuration, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use viber::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let bot = Bot::new(config.bot.clone())?;
//!
//!     let _ = bot.on_text_message(Regex::new(".*")?, |message, response| async move {
//!         response.send(message, None).await?;
//!         Ok(())
//!     });
//!
//!     let listener = bot.listen(&config.webhook).await?;
//!     bot.set_webhook("https://example.com/viber/webhook", false).await?;
//!     listener.wait().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use viber_bot as bot;
pub use viber_core as core;
pub use viber_transport as transport;

/// Prelude module for convenient imports.
pub mod prelude {
    // Bot and handler plumbing
    pub use viber_bot::{
        Bot, ConversationFinish, HandlerResult, ListenerHandle, Response, Subscription,
    };

    // Configuration
    pub use viber_bot::config::{
        BotConfiguration, ConfigLoader, ViberConfig, load_config, validate_config,
    };
    pub use viber_bot::logging::init_from_config;

    // Data model
    pub use viber_core::{
        AccountInfo, ApiError, ApiResponse, BotError, CallbackType, Document, Envelope,
        EventKind, Message, MessageKind, User, UserDetails, UserProfile, UserStatus,
    };

    pub use viber_bot::regex::Regex;
}
