//! Shared HTTP session context
//!
//! The context owns the cookie-carrying client and the site base URL. The
//! login protocol writes session cookies through it and the fetch transport
//! reuses them. Nothing else holds a client, so session state is never ambient.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::config::{ClientConfig, SiteConfig};
use crate::errors::{AuthError, AuthResult, FetchError, FetchResult};

/// Cookie jar, base URL and site markers for one external site
#[derive(Debug)]
pub struct SessionContext {
    client: Client,
    base_url: Url,
    site: SiteConfig,
    request_timeout: Duration,
}

impl SessionContext {
    /// Build a context with a fresh cookie store
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the client cannot be built and
    /// `AuthError::InvalidEndpoint` if the base URL does not parse.
    pub fn new(client_config: &ClientConfig, site: SiteConfig) -> AuthResult<Self> {
        let client = client_config.build_http_client()?;
        let base_url = site
            .parsed_base_url()
            .map_err(|e| AuthError::InvalidEndpoint {
                path: site.base_url.clone(),
                error: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            site,
            request_timeout: client_config.request_timeout,
        })
    }

    /// The shared cookie-aware client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The site base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Site endpoint configuration
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Per-request timeout the client was built with
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Resolve an absolute or base-relative URL
    pub fn resolve(&self, url: &str) -> FetchResult<Url> {
        resolve_url(&self.base_url, url)
    }
}

/// Resolve `url` against `base`, accepting absolute URLs unchanged
pub fn resolve_url(base: &Url, url: &str) -> FetchResult<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            error: "empty URL".to_string(),
        });
    }

    match Url::parse(trimmed) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).map_err(|e| FetchError::InvalidUrl {
                url: url.to_string(),
                error: e.to_string(),
            })
        }
        Err(e) => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        }),
    }
}
