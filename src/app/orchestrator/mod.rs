//! Report acquisition
//!
//! The orchestrator composes the pipeline for one report request:
//!
//! 1. parsed-result cache
//! 2. raw-snapshot cache, re-parsed without touching the network
//! 3. wait for an authenticated session
//! 4. fetch through the gateway (one forced re-login on expiry)
//! 5. parse, then write the raw snapshot and the parsed records
//!
//! All work on one cache key is serialized, so concurrent misses for the same
//! report produce one fetch. External failures end in an empty result and a
//! warning; only caller mistakes are returned as errors.
//!
//! - [`options`] - per-call cache key, TTL, bypass and parse metadata
//! - [`background_tasks`] - session refresh and cache purge tasks
//! - [`signals`] - shutdown on CTRL-C / SIGTERM

pub mod background_tasks;
pub mod options;
pub mod signals;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::cache::CacheLayers;
use crate::app::client::{
    resolve_url, FetchGateway, HttpHandler, ReportDocument, ReportRequest, SessionContext,
    StepUpLogin,
};
use crate::app::parser::{apply_links, HasLinks, Link, ParseMetadata, ReportParser};
use crate::app::session::SessionCoordinator;
use crate::auth::Credentials;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

pub use background_tasks::BackgroundTaskManager;
pub use options::{AcquireOptions, CacheControl};
pub use signals::{create_shutdown_channel, wait_for_signal, ShutdownReason, SignalHandler};

/// Entry point for acquiring parsed report data
#[derive(Debug, Clone)]
pub struct ReportOrchestrator {
    session: SessionCoordinator,
    gateway: FetchGateway,
    cache: Arc<CacheLayers>,
    base_url: Url,
}

impl ReportOrchestrator {
    /// Assemble an orchestrator from its collaborators
    pub fn new(
        session: SessionCoordinator,
        gateway: FetchGateway,
        cache: Arc<CacheLayers>,
        base_url: Url,
    ) -> Self {
        Self {
            session,
            gateway,
            cache,
            base_url,
        }
    }

    /// Wire the production pipeline from configuration and credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, the base URL is
    /// invalid or the rate limit is zero.
    pub fn from_config(config: &AppConfig, credentials: Credentials) -> Result<Self> {
        let context = Arc::new(SessionContext::new(&config.client, config.site.clone())?);
        let transport = Arc::new(HttpHandler::new(
            Arc::clone(&context),
            config.client.rate_limit_rps,
        )?);
        let login = Arc::new(StepUpLogin::new(Arc::clone(&context), credentials));

        let session = SessionCoordinator::new(login, config.session.clone());
        let gateway = FetchGateway::new(
            transport,
            session.clone(),
            config.site.login_required_title.clone(),
        );
        let cache = Arc::new(CacheLayers::in_memory(config.cache.clone()));

        info!("Report pipeline ready for {}", context.base_url());
        Ok(Self::new(session, gateway, cache, context.base_url().clone()))
    }

    pub fn session(&self) -> &SessionCoordinator {
        &self.session
    }

    pub fn cache(&self) -> &Arc<CacheLayers> {
        &self.cache
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Start the session refresh loop and the cache purge task
    pub fn start_background_tasks(
        &self,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> BackgroundTaskManager {
        let mut manager = BackgroundTaskManager::new();
        manager.start_session_refresh_task(&self.session, shutdown_tx.subscribe());
        manager.start_cache_purge_task(Arc::clone(&self.cache), shutdown_tx.subscribe());
        manager
    }

    /// Acquire parsed records for a report
    ///
    /// Returns an empty vector when authentication, the fetch or parsing
    /// produce nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError` for a blank cache key, a zero TTL or a URL that
    /// cannot be resolved against the base URL.
    pub async fn get_data<P: ReportParser>(
        &self,
        request: &ReportRequest,
        parser: &P,
        options: &AcquireOptions,
    ) -> Result<Vec<P::Record>> {
        resolve_url(&self.base_url, &request.url)?;

        let ttl = options.ttl.unwrap_or(self.cache.config().default_ttl);
        let key = match options.cache_key.as_deref() {
            Some(key) => {
                CacheLayers::validate_key(key)?;
                CacheLayers::validate_ttl(key, ttl)?;
                key
            }
            None => {
                if ttl.is_zero() {
                    return Err(AppError::invalid_request("TTL must be greater than zero"));
                }
                return Ok(self
                    .acquire_live(request, parser, options.metadata.as_ref())
                    .await
                    .map(|(_, records)| records)
                    .unwrap_or_default());
            }
        };

        let _guard = self.cache.lock(key).await;
        let metadata = options.metadata.as_ref();

        if options.cache_control.is_bypass() {
            debug!("Cache bypass requested for {}", key);
        } else {
            if let Some(records) = self.cache.get_parsed::<P::Record>(key).await {
                return Ok(records);
            }

            if let Some(records) = self.reparse_raw(key, parser, metadata).await {
                if let Err(e) = self.cache.set_parsed(key, &records, ttl).await {
                    warn!("Could not cache parsed {} records: {}", parser.name(), e);
                }
                return Ok(records);
            }
        }

        let Some((document, records)) = self.acquire_live(request, parser, metadata).await else {
            return Ok(Vec::new());
        };

        if let Err(e) = self.cache.set_raw(key, &document.snapshot()).await {
            warn!("Could not cache raw page for {}: {}", key, e);
        }
        if records.is_empty() {
            debug!("Not caching empty {} result for {}", parser.name(), key);
        } else if let Err(e) = self.cache.set_parsed(key, &records, ttl).await {
            warn!("Could not cache parsed {} records: {}", parser.name(), e);
        }

        Ok(records)
    }

    /// `get_data`, then attach links built by `builder` to every record
    pub async fn get_data_with_links<P, F>(
        &self,
        request: &ReportRequest,
        parser: &P,
        options: &AcquireOptions,
        builder: F,
    ) -> Result<Vec<P::Record>>
    where
        P: ReportParser,
        P::Record: HasLinks,
        F: Fn(&P::Record) -> Vec<Link>,
    {
        let mut records = self.get_data(request, parser, options).await?;
        apply_links(&mut records, builder);
        Ok(records)
    }

    /// Re-parse a cached raw snapshot
    ///
    /// A snapshot that is blank or parses to nothing is dropped and treated
    /// as a miss.
    async fn reparse_raw<P: ReportParser>(
        &self,
        key: &str,
        parser: &P,
        metadata: Option<&ParseMetadata>,
    ) -> Option<Vec<P::Record>> {
        let snapshot = self.cache.get_raw(key).await?;
        let Some(document) = snapshot.into_document() else {
            warn!("Discarding blank raw snapshot for {}", key);
            self.cache.invalidate_raw(key).await;
            return None;
        };

        let records = parse_document(parser, &document, metadata);
        if records.is_empty() {
            debug!(
                "Raw snapshot for {} yielded no {} records, fetching live",
                key,
                parser.name()
            );
            self.cache.invalidate_raw(key).await;
            return None;
        }

        debug!(
            "Re-parsed {} {} records from raw snapshot {}",
            records.len(),
            parser.name(),
            key
        );
        Some(records)
    }

    /// Authenticate, fetch and parse
    async fn acquire_live<P: ReportParser>(
        &self,
        request: &ReportRequest,
        parser: &P,
        metadata: Option<&ParseMetadata>,
    ) -> Option<(ReportDocument, Vec<P::Record>)> {
        if !self.session.wait_until_authenticated().await {
            warn!(
                "Not authenticated, returning no {} data for {}",
                parser.name(),
                request.url
            );
            return None;
        }

        let Some(document) = self.gateway.fetch(request).await else {
            warn!(
                "Fetch failed, returning no {} data for {}",
                parser.name(),
                request.url
            );
            return None;
        };

        let records = parse_document(parser, &document, metadata);
        Some((document, records))
    }
}

/// Parse synchronously; the DOM never lives across an await
fn parse_document<P: ReportParser>(
    parser: &P,
    document: &ReportDocument,
    metadata: Option<&ParseMetadata>,
) -> Vec<P::Record> {
    let html = document.html();
    parser.parse_report(&html, metadata)
}
