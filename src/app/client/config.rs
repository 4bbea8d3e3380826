//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the cookie-aware
//! HTTP client shared by the login protocol and the fetch gateway.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{http, limits, site};
use crate::errors::{AuthError, AuthResult, FetchError, FetchResult};

/// Configuration for the HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP keep-alive settings
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(Duration::from_secs(30)),
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> AuthResult<Client> {
        let mut client_builder = Client::builder()
            .cookie_store(true) // session cookies from login are reused by every fetch
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(AuthError::Http)
    }
}

/// Location and markers of the external site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL that relative report URLs and login paths resolve against
    pub base_url: String,
    /// Primary login endpoint
    pub login_path: String,
    /// Admin elevation endpoint
    pub step_up_path: String,
    /// Title phrase identifying the login-required page
    pub login_required_title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: site::DEFAULT_BASE_URL.to_string(),
            login_path: site::LOGIN_PATH.to_string(),
            step_up_path: site::STEP_UP_PATH.to_string(),
            login_required_title: site::LOGIN_REQUIRED_TITLE.to_string(),
        }
    }
}

impl SiteConfig {
    /// Create a site configuration for a specific base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parse the configured base URL
    pub fn parsed_base_url(&self) -> FetchResult<Url> {
        Url::parse(&self.base_url).map_err(|e| FetchError::InvalidUrl {
            url: self.base_url.clone(),
            error: e.to_string(),
        })
    }
}
