//! Configuration management for IG Fetcher
//!
//! This module provides unified configuration management with multi-location
//! discovery, zero-config defaults and a commented default file for
//! `config init`. Every section falls back to its defaults when omitted.

use std::env;
use std::path::{Path, PathBuf};

use humantime_serde::re::humantime::format_duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::{CacheConfig, ClientConfig, SessionConfig, SiteConfig};
use crate::constants::env as env_constants;
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External site endpoints and markers
    pub site: SiteConfig,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Session lifecycle timings
    pub session: SessionConfig,
    /// Cache tiers
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, then standard locations)
    /// 3. `IG_BASE_URL` environment override
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound { path }.into());
            }
            Some(path) => Some(path),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var(env_constants::BASE_URL) {
            let base_url = base_url.trim();
            if !base_url.is_empty() {
                debug!("Base URL overridden by {}", env_constants::BASE_URL);
                self.site.base_url = base_url.to_string();
            }
        }
    }

    /// Check every section, collecting all problems
    ///
    /// A raw TTL that is not shorter than the parsed TTL is accepted with a
    /// warning.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.site.parsed_base_url() {
            errors.push(format!("site.base_url '{}': {}", self.site.base_url, e));
        }
        if self.site.login_required_title.trim().is_empty() {
            errors.push("site.login_required_title must not be empty".to_string());
        }
        if self.client.rate_limit_rps == 0 {
            errors.push("client.rate_limit_rps must be greater than zero".to_string());
        }
        if let Err(e) = self.session.validate() {
            errors.push(format!("session: {}", e));
        }
        if let Err(e) = self.cache.validate() {
            errors.push(format!("cache: {}", e));
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationFailed { errors }.into());
        }

        if self.cache.raw_ttl_exceeds_default() {
            warn!(
                "cache.raw_ttl ({:?}) is not shorter than cache.default_ttl ({:?})",
                self.cache.raw_ttl, self.cache.default_ttl
            );
        }

        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![
            // Project-local config
            PathBuf::from("./ig-fetcher.toml"),
            PathBuf::from("./config.toml"),
        ];
        // User config
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// The default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ig-fetcher").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e).into())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e).into())
    }

    /// Write a commented default file, refusing to overwrite unless forced
    pub async fn init(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let config_path = match path.or_else(Self::default_config_path) {
            Some(path) => path,
            None => return Err(AppError::generic("Could not determine user config directory")),
        };

        if config_path.exists() && !force {
            return Err(AppError::generic(format!(
                "Config file already exists: {} (use --force to overwrite)",
                config_path.display()
            )));
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::generic(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        info!("Created default configuration file: {}", config_path.display());
        Ok(config_path)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let defaults = Self::default();
        format!(
            r#"# IG Fetcher Configuration
# Durations use humantime notation ("90s", "10m", "1h").
# Every setting is optional; omitted values use the defaults shown here.

[site]
# Club site root; IG_BASE_URL overrides this
base_url = "{base_url}"
login_path = "{login_path}"
step_up_path = "{step_up_path}"
# Page title phrase shown when the session has expired
login_required_title = "{marker}"

[client]
tcp_keepalive = "30s"
pool_idle_timeout = "{pool_idle}"
pool_max_per_host = {pool_max}
request_timeout = "{request_timeout}"
connect_timeout = "{connect_timeout}"
# Outbound requests per second
rate_limit_rps = {rps}

[session]
# Force a fresh login once the session is this old
refresh_interval = "{refresh}"
refresh_check_interval = "{check}"
# Time budget for the two-step login
login_timeout = "{login_timeout}"

[cache]
# TTL of parsed records when the caller gives none
default_ttl = "{default_ttl}"
# TTL of raw page snapshots; keep shorter than default_ttl
raw_ttl = "{raw_ttl}"
raw_key_suffix = "{suffix}"
purge_interval = "{purge}"

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            base_url = defaults.site.base_url,
            login_path = defaults.site.login_path,
            step_up_path = defaults.site.step_up_path,
            marker = defaults.site.login_required_title,
            pool_idle = humantime_str(defaults.client.pool_idle_timeout),
            pool_max = defaults.client.pool_max_per_host,
            request_timeout = format_duration(defaults.client.request_timeout),
            connect_timeout = format_duration(defaults.client.connect_timeout),
            rps = defaults.client.rate_limit_rps,
            refresh = format_duration(defaults.session.refresh_interval),
            check = format_duration(defaults.session.refresh_check_interval),
            login_timeout = format_duration(defaults.session.login_timeout),
            default_ttl = format_duration(defaults.cache.default_ttl),
            raw_ttl = format_duration(defaults.cache.raw_ttl),
            suffix = defaults.cache.raw_key_suffix,
            purge = format_duration(defaults.cache.purge_interval),
            level = defaults.logging.level,
        )
    }
}

fn humantime_str(duration: Option<std::time::Duration>) -> String {
    duration
        .map(|d| format_duration(d).to_string())
        .unwrap_or_else(|| "0s".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.client.rate_limit_rps, crate::constants::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.site.login_required_title, "Login Required");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_content_parses_to_defaults() {
        let content = AppConfig::generate_default_config_content();
        assert!(content.contains("# IG Fetcher Configuration"));
        assert!(content.contains("[session]"));

        let parsed = AppConfig::from_toml(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
[site]
base_url = "https://club.example.org"

[cache]
default_ttl = "30m"
"#,
        )
        .unwrap();

        assert_eq!(config.site.base_url, "https://club.example.org");
        assert_eq!(config.site.login_path, crate::constants::site::LOGIN_PATH);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.cache.raw_ttl, crate::constants::cache::RAW_TTL);
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_validation_collects_errors() {
        let mut config = AppConfig::default();
        config.client.rate_limit_rps = 0;
        config.site.login_required_title = " ".to_string();
        config.cache.default_ttl = Duration::ZERO;

        match config.validate() {
            Err(AppError::Config(ConfigError::ValidationFailed { errors })) => {
                assert_eq!(errors.len(), 3);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_long_raw_ttl_is_only_a_warning() {
        let mut config = AppConfig::default();
        config.cache.raw_ttl = Duration::from_secs(3600);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ig-fetcher.toml");
        tokio::fs::write(
            &config_path,
            r#"
[client]
rate_limit_rps = 2

[session]
refresh_interval = "15m"

[logging]
level = "debug"
"#,
        )
        .await
        .unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();
        assert_eq!(config.client.rate_limit_rps, 2);
        assert_eq!(config.session.refresh_interval, Duration::from_secs(15 * 60));
        assert_eq!(config.logging.level, "debug");
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[cache]\ndefault_ttl = \"soon\"\n")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let written = AppConfig::init(Some(config_path.clone()), false).await.unwrap();
        assert_eq!(written, config_path);
        assert!(config_path.exists());

        assert!(AppConfig::init(Some(config_path.clone()), false).await.is_err());
        assert!(AppConfig::init(Some(config_path), true).await.is_ok());
    }
}
