//! # Viber Transport
//!
//! Network transport for the Viber bot SDK.
//!
//! This crate provides the two HTTP directions a bot needs, behind feature
//! flags:
//!
//! - `http-client`: [`HttpApiCaller`], a `reqwest` client for the REST API
//! - `http-server`: the webhook [`router`] (an `axum` router that verifies
//!   content signatures) and [`serve`]
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  viber-bot          │  (implements WebhookHandler, owns an ApiCaller)
//! ├─────────────────────┤
//! │  viber-transport    │  <- This crate
//! ├─────────────────────┤
//! │  Network (HTTP)     │
//! └─────────────────────┘
//! ```
//!
//! The seams are two traits that carry no transport types:
//!
//! | Trait | Direction | Implemented by |
//! |-------|-----------|----------------|
//! | [`ApiCaller`] | bot → platform | [`HttpApiCaller`], test doubles |
//! | [`WebhookHandler`] | platform → bot | the bot |

pub mod caller;

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

pub use caller::{ApiCaller, BoxedApiCaller, BoxedWebhookHandler, WebhookHandler};

#[cfg(feature = "http-client")]
pub use http::HttpApiCaller;

#[cfg(feature = "http-server")]
pub use http::{ListenerHandle, router, serve, sign, verify_signature};
