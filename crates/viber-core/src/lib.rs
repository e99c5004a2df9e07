//! # Viber Core
//!
//! Protocol models and error types for the Viber bot SDK.
//!
//! This crate performs no I/O. It describes the values exchanged with the
//! platform:
//!
//! - **Users**: [`UserProfile`] and the extended [`User`]
//! - **Messages**: [`Message`], a [`MessageKind`] payload plus shared
//!   [`MessageOptions`]
//! - **Responses**: the [`ApiResponse`] envelope and the endpoint responses
//!   embedding it ([`AccountInfo`], [`UserDetails`], [`UserStatus`])
//! - **Callbacks**: webhook payloads ([`Callback`])
//! - **Events**: [`EventKind`] for handler registration, [`CallbackType`] for
//!   the wire
//! - **Errors**: [`ApiError`], [`CallbackError`], [`BotError`]
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────┐
//! │  viber-bot      │  Bot, handlers, config, logging
//! ├─────────────────┤
//! │  viber-transport│  reqwest client, axum webhook
//! ├─────────────────┤
//! │  viber-core     │  <- This crate (models, errors)
//! └─────────────────┘
//! ```

pub mod error;
pub mod model;

pub use error::{
    ApiError, ApiResult, BotError, CallbackError, CallbackResult, TransportError, TransportResult,
};
pub use model::*;
