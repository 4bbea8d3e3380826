//! Report fetching with session-expiry recovery
//!
//! The gateway sends a report request, decodes the body and checks the page
//! title for the login-required marker. On expiry it asks the session
//! coordinator for a fresh login and replays the identical request exactly
//! once. Every external failure resolves to `None`.

use std::sync::Arc;

use super::document::ReportDocument;
use super::http::{ReportRequest, Transport};
use crate::app::session::SessionCoordinator;

/// Outcome of a single request attempt
enum Attempt {
    Document(ReportDocument),
    LoginRequired,
    Failed,
}

/// Fetches report pages with an at-most-once forced re-login
#[derive(Clone)]
pub struct FetchGateway {
    transport: Arc<dyn Transport>,
    session: SessionCoordinator,
    login_marker: String,
}

impl std::fmt::Debug for FetchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchGateway")
            .field("login_marker", &self.login_marker)
            .finish_non_exhaustive()
    }
}

impl FetchGateway {
    /// Create a gateway over a transport and the shared session
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionCoordinator,
        login_marker: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session,
            login_marker: login_marker.into(),
        }
    }

    /// The session coordinator this gateway reauthenticates through
    pub fn session(&self) -> &SessionCoordinator {
        &self.session
    }

    /// Fetch a report page
    ///
    /// Returns `None` on a non-success status, a transport error, an
    /// undecodable body, or a login-required page that persists after one
    /// forced re-login.
    pub async fn fetch(&self, request: &ReportRequest) -> Option<ReportDocument> {
        let observed_generation = self.session.generation().await;

        match self.attempt(request).await {
            Attempt::Document(document) => return Some(document),
            Attempt::Failed => return None,
            Attempt::LoginRequired => {}
        }

        tracing::warn!(
            "Session expired while fetching {}, forcing re-login",
            request.url
        );
        if !self.session.reauthenticate(observed_generation).await {
            tracing::error!("Re-login failed, giving up on {}", request.url);
            return None;
        }

        match self.attempt(request).await {
            Attempt::Document(document) => Some(document),
            Attempt::LoginRequired => {
                tracing::error!(
                    "Login still required after re-login, giving up on {}",
                    request.url
                );
                None
            }
            Attempt::Failed => None,
        }
    }

    async fn attempt(&self, request: &ReportRequest) -> Attempt {
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Request for {} failed: {}", request.url, e);
                return Attempt::Failed;
            }
        };

        if !response.status.is_success() {
            tracing::warn!(
                "Report {} returned HTTP {}",
                request.url,
                response.status.as_u16()
            );
            return Attempt::Failed;
        }

        match ReportDocument::from_body(&response.body) {
            Ok(document) if document.requires_login(&self.login_marker) => Attempt::LoginRequired,
            Ok(document) => Attempt::Document(document),
            Err(e) => {
                tracing::warn!("Could not decode report {}: {}", request.url, e);
                Attempt::Failed
            }
        }
    }
}
