//! HTTP transport implementations.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
mod signature;

#[cfg(feature = "http-client")]
pub use client::HttpApiCaller;
#[cfg(feature = "http-server")]
pub use server::{ListenerHandle, router, serve};
#[cfg(feature = "http-server")]
pub use signature::{sign, verify_signature};
