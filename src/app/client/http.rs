//! Core HTTP operations with rate limiting
//!
//! This module provides the `Transport` seam used by the fetch gateway and its
//! production implementation over the shared session context. Requests are
//! rate limited but never retried here; the only retry in the pipeline is the
//! gateway's single forced re-login retry.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::StatusCode;

use super::session::SessionContext;
use crate::constants::http;
use crate::errors::{ConfigError, FetchError, FetchResult};

/// HTTP verb of a report request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read-only report
    Get,
    /// Parameterised or filtered report with a form body
    Post,
}

/// One report request, replayable verbatim on retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Absolute URL or path relative to the site base URL
    pub url: String,
    /// HTTP verb
    pub method: HttpMethod,
    /// Form-encoded body fields (POST only)
    pub form: Vec<(String, String)>,
}

impl ReportRequest {
    /// GET request for a read-only report
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            form: Vec::new(),
        }
    }

    /// POST request with a form-encoded body
    pub fn post<K, V>(url: impl Into<String>, form: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            form: form
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Response status
    pub status: StatusCode,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Successful response with a body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }
}

/// Issues report requests against the external site
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request once and return whatever the server answered
    async fn send(&self, request: &ReportRequest) -> FetchResult<TransportResponse>;
}

/// Rate-limited transport over the shared session context
#[derive(Debug)]
pub struct HttpHandler {
    context: Arc<SessionContext>,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given context and rate limit
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the rate limit is zero
    pub fn new(context: Arc<SessionContext>, rate_limit_rps: u32) -> Result<Self, ConfigError> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            context,
            rate_limiter,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> Result<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>, ConfigError>
    {
        let per_second =
            NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: rate_limit_rps.to_string(),
                reason: "Rate limit must be non-zero".to_string(),
            })?;
        Ok(RateLimiter::direct(Quota::per_second(per_second)))
    }

    /// The session context this handler sends through
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }
}

#[async_trait]
impl Transport for HttpHandler {
    async fn send(&self, request: &ReportRequest) -> FetchResult<TransportResponse> {
        let url = self.context.resolve(&request.url)?;

        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(http::RATE_LIMIT_JITTER))
            .await;

        let builder = match request.method {
            HttpMethod::Get => self.context.client().get(url.as_str()),
            HttpMethod::Post => self.context.client().post(url.as_str()).form(&request.form),
        };

        let timeout = self.context.request_timeout();
        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(e, timeout))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(e, timeout))?;

        tracing::debug!(
            "{:?} {} -> {} ({} bytes)",
            request.method,
            url,
            status,
            body.len()
        );

        Ok(TransportResponse { status, body })
    }
}

fn classify_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else {
        FetchError::Http(error)
    }
}
