//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML files (`viber.toml`, `config.toml`)
//! - `yaml-config`: enables YAML files (`viber.yaml`, `viber.yml`, `config.yaml`, `config.yml`)
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults (webhook and logging sections only)
//! 2. Profile-specific config file (`viber.{profile}.toml`)
//! 3. Main config file (`viber.toml`)
//! 4. Environment variables (`VIBER_*`)
//! 5. Programmatic overrides
//!
//! The `bot` section has no defaults. Loading fails unless one of the sources
//! provides `auth_token`, `name` and `avatar`.
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `VIBER_` prefix with `__` as separator:
//!
//! - `VIBER_BOT__AUTH_TOKEN=xxx` → `bot.auth_token = "xxx"`
//! - `VIBER_WEBHOOK__PORT=8443` → `webhook.port = 8443`
//! - `VIBER_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! `VIBER_PROFILE` selects the profile and is not part of the configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use viber_bot::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/viber.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::{LoggingConfig, ViberConfig, WebhookConfig};

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting `dev` and `prod` shorthands.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `VIBER_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var("VIBER_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a complete configuration over every other source.
    pub fn merge(mut self, config: ViberConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Sets a single dotted key, e.g. `("webhook.port", 8443)`.
    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<ViberConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: ViberConfig = figment.extract().map_err(|e| {
            ConfigError::Parse(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            bot = %config.bot.name,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::new()
            .merge(Serialized::default("webhook", WebhookConfig::default()))
            .merge(Serialized::default("logging", LoggingConfig::default()));

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with VIBER_ prefix");
            figment = figment.merge(Env::prefixed("VIBER_").ignore(&["profile"]).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::Parse(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    /// Current directory and `~/.config/viber` unless paths were given.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("viber"));
        }
        paths
    }

    /// Tries `search_paths × base_names`, merging the profile variant before
    /// its base file. Stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{}.{}.{}", stem, self.profile.as_str(), ext));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["viber.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["viber.yaml", "viber.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found");
        }
        figment
    }
}

/// Loads the configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<ViberConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path` and the environment.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<ViberConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BotConfiguration, LogLevel};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("viber-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_bot_section_fails() {
        let dir = scratch_dir("empty");
        let result = ConfigLoader::new().search_path(&dir).without_env().load();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = ConfigLoader::new()
            .file("/nonexistent/viber.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_programmatic_config() {
        let config = ConfigLoader::new()
            .search_path(scratch_dir("programmatic"))
            .without_env()
            .set("bot", BotConfiguration::new("token", "Echo", ""))
            .set("logging.level", "debug")
            .load()
            .unwrap();

        assert_eq!(config.bot.auth_token, "token");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.webhook.port, 8080);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_base_file() {
        let dir = scratch_dir("toml");
        std::fs::write(
            dir.join("viber.toml"),
            "[bot]\nauth_token = \"base\"\nname = \"Echo\"\navatar = \"\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("viber.staging.toml"),
            "[bot]\nauth_token = \"staging\"\nname = \"Staging\"\navatar = \"\"\n\n[webhook]\nport = 9000\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(&dir)
            .profile("staging")
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.bot.auth_token, "base");
        assert_eq!(config.webhook.port, 9000);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_without_credentials_fails() {
        let dir = scratch_dir("partial");
        let path = dir.join("partial.toml");
        std::fs::write(&path, "[bot]\nname = \"Echo\"\navatar = \"\"\n").unwrap();

        let err = ConfigLoader::new().file(&path).without_env().load().unwrap_err();
        assert!(err.to_string().contains("auth_token"), "{err}");
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: the variable is unique to this test and removed right after.
        unsafe {
            std::env::set_var("VIBER_BOT__AUTH_TOKEN", "from-env");
        }
        let config = ConfigLoader::new()
            .search_path(scratch_dir("env"))
            .set("bot.name", "Echo")
            .set("bot.avatar", "")
            .load();
        unsafe {
            std::env::remove_var("VIBER_BOT__AUTH_TOKEN");
        }

        assert_eq!(config.unwrap().bot.auth_token, "from-env");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("DEV"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
