//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfiguration, LogOutput, LoggingConfig, ViberConfig, WebhookConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ViberConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_webhook_config(&config.webhook)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates a bot account.
pub fn validate_bot_config(bot: &BotConfiguration) -> ConfigResult<()> {
    if bot.auth_token.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.auth_token"));
    }

    if bot.name.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.name"));
    }

    if !bot.avatar.is_empty() {
        validate_url(&bot.avatar, &["http://", "https://"])?;
    }

    validate_url(&bot.api_url, &["http://", "https://"])?;

    if bot.timeout_ms == 0 {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }

    if bot.conversation_reply_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Conversation reply timeout must be greater than 0",
        ));
    }

    if let Some(logger) = &bot.logger {
        validate_logging_config(logger)?;
    }

    Ok(())
}

fn validate_webhook_config(webhook: &WebhookConfig) -> ConfigResult<()> {
    if webhook.port == 0 {
        return Err(ConfigError::InvalidPort(webhook.port));
    }

    if !webhook.path.starts_with('/') {
        return Err(ConfigError::validation("Webhook path must start with '/'"));
    }

    // The platform only calls HTTPS webhooks.
    if let Some(url) = &webhook.public_url {
        validate_url(url, &["https://"])?;
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_url(url: &str, schemes: &[&str]) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }

    if !schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {:?}", schemes),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ViberConfig {
        ViberConfig {
            bot: BotConfiguration::new("token", "Echo", "https://example.com/avatar.jpg"),
            webhook: WebhookConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_validate_default_sections() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_validate_credentials() {
        let mut config = config();
        config.bot.auth_token = " ".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "bot.auth_token"
        ));
    }

    #[test]
    fn test_validate_urls() {
        let mut config = config();
        config.webhook.public_url = Some("http://example.com/hook".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));

        let mut config = self::config();
        config.bot.avatar = "ftp://example.com/a.png".into();
        assert!(validate_config(&config).is_err());

        let mut config = self::config();
        config.bot.avatar.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_webhook() {
        let mut config = config();
        config.webhook.port = 0;
        assert!(matches!(validate_config(&config), Err(ConfigError::InvalidPort(0))));

        let mut config = self::config();
        config.webhook.path = "hook".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = config();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
    }
}
