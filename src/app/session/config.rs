//! Configuration for the session coordinator

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::session;

/// Timing of session freshness, refresh and login attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions older than this are refreshed before use and by the refresh loop
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// How often the background loop checks session age
    #[serde(with = "humantime_serde")]
    pub refresh_check_interval: Duration,
    /// Upper bound on one complete two-step login
    #[serde(with = "humantime_serde")]
    pub login_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: session::REFRESH_INTERVAL,
            refresh_check_interval: session::REFRESH_CHECK_INTERVAL,
            login_timeout: session::LOGIN_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Set the refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the background check interval
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.refresh_check_interval = interval;
        self
    }

    /// Set the login timeout
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.refresh_interval.is_zero() {
            return Err("Session refresh interval cannot be zero".to_string());
        }

        if self.refresh_check_interval.is_zero() {
            return Err("Session check interval cannot be zero".to_string());
        }

        if self.login_timeout.is_zero() {
            return Err("Login timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_interval, session::REFRESH_INTERVAL);
    }

    #[test]
    fn test_config_validation() {
        let config = SessionConfig::default().with_refresh_interval(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = SessionConfig::default().with_check_interval(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = SessionConfig::default().with_login_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_humantime_round_trip() {
        let config: SessionConfig = toml::from_str(
            r#"
            refresh_interval = "15m"
            login_timeout = "30s"
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(15 * 60));
        assert_eq!(config.login_timeout, Duration::from_secs(30));
        assert_eq!(
            config.refresh_check_interval,
            session::REFRESH_CHECK_INTERVAL
        );
    }
}
