//! Configuration for Viber bots.
//!
//! [`ViberConfig`] bundles the bot account, the webhook listener and the
//! logging setup. [`ConfigLoader`] assembles it from TOML/YAML files and
//! `VIBER_*` environment variables; [`validate_config`] checks it.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfiguration, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig,
    ViberConfig, WebhookConfig,
};
pub use validation::{validate_bot_config, validate_config};
