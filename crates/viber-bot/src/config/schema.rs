//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use viber_core::{CallbackType, DEFAULT_API_URL};

/// Root configuration structure.
///
/// There is no `Default`: the bot credentials must come from a file, the
/// environment or code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViberConfig {
    /// The bot account.
    pub bot: BotConfiguration,

    /// Where the webhook listens and what URL is registered.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Process-wide logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Settings of a single bot account.
///
/// `auth_token`, `name` and `avatar` have no defaults; deserializing a
/// configuration without them fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfiguration {
    /// Account auth token from the Viber admin panel.
    pub auth_token: String,

    /// Sender name shown next to sent messages.
    pub name: String,

    /// Sender avatar URL. May be empty.
    pub avatar: String,

    /// Logging installed by `Bot::new`, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<LoggingConfig>,

    /// Callback types requested from `set_webhook`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_to_events: Option<Vec<CallbackType>>,

    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long a `conversation_started` callback waits for a welcome reply.
    #[serde(default = "default_conversation_reply_timeout_ms")]
    pub conversation_reply_timeout_ms: u64,
}

impl BotConfiguration {
    /// Creates a configuration with the three required fields.
    pub fn new(
        auth_token: impl Into<String>,
        name: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            auth_token: auth_token.into(),
            name: name.into(),
            avatar: avatar.into(),
            logger: None,
            register_to_events: None,
            api_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
            conversation_reply_timeout_ms: default_conversation_reply_timeout_ms(),
        }
    }

    pub fn with_logger(mut self, logger: LoggingConfig) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = CallbackType>) -> Self {
        self.register_to_events = Some(events.into_iter().collect());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_conversation_reply_timeout(mut self, timeout: Duration) -> Self {
        self.conversation_reply_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the welcome reply timeout.
    pub fn conversation_reply_timeout(&self) -> Duration {
        Duration::from_millis(self.conversation_reply_timeout_ms)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_conversation_reply_timeout_ms() -> u64 {
    5000
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path for the callback endpoint.
    #[serde(default = "default_webhook_path")]
    pub path: String,

    /// Public HTTPS URL registered with `set_webhook`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Whether the webhook is registered in inline mode.
    #[serde(default)]
    pub is_inline: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_webhook_path(),
            public_url: None,
            is_inline: false,
        }
    }
}

impl WebhookConfig {
    /// Returns `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/viber/webhook".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used with [`LogOutput::File`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `viber_transport = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bot_configuration_requires_credentials() {
        let full = json!({"auth_token": "t", "name": "n", "avatar": "a"});
        let config: BotConfiguration = serde_json::from_value(full.clone()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.conversation_reply_timeout(), Duration::from_secs(5));
        assert!(config.logger.is_none());

        for field in ["auth_token", "name", "avatar"] {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(field);
            let err = serde_json::from_value::<BotConfiguration>(partial).unwrap_err();
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn test_register_to_events() {
        let config: BotConfiguration = serde_json::from_value(json!({
            "auth_token": "t",
            "name": "n",
            "avatar": "",
            "register_to_events": ["delivered", "seen", "conversation_started"],
            "logger": {"level": "debug"}
        }))
        .unwrap();

        assert_eq!(
            config.register_to_events,
            Some(vec![
                CallbackType::Delivered,
                CallbackType::Seen,
                CallbackType::ConversationStarted
            ])
        );
        assert_eq!(config.logger.unwrap().level, LogLevel::Debug);
    }

    #[test]
    fn test_webhook_defaults() {
        let webhook = WebhookConfig::default();
        assert_eq!(webhook.listen_addr(), "0.0.0.0:8080");
        assert_eq!(webhook.path, "/viber/webhook");
        assert!(!webhook.is_inline);
    }
}
