//! Single-flight session coordinator
//!
//! The coordinator is the sole owner of the session lifecycle. At most one
//! login runs at a time: it is spawned as its own task and exposed as a
//! shared future, so every caller that arrives while it is in flight awaits
//! the same outcome and dropping a waiter never cancels the login.

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::state::{PendingLogin, SessionPhase, SessionSnapshot, SessionState};
use crate::app::client::LoginProtocol;

struct Inner {
    login: Arc<dyn LoginProtocol>,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

/// Cloneable handle to the shared session
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl SessionCoordinator {
    /// Create a coordinator in the unauthenticated state
    pub fn new(login: Arc<dyn LoginProtocol>, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                login,
                config,
                state: Mutex::new(SessionState::new()),
            }),
        }
    }

    /// Coordinator configuration
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Wait until the session is usable
    ///
    /// Joins an in-flight login if there is one, returns immediately for a
    /// fresh session, and otherwise starts a login. Returns the outcome.
    pub async fn wait_until_authenticated(&self) -> bool {
        let pending = {
            let mut state = self.inner.state.lock().await;
            if let Some(pending) = &state.pending {
                debug!("Joining in-flight login");
                pending.clone()
            } else if state.is_fresh(Utc::now(), self.inner.config.refresh_interval) {
                return true;
            } else {
                self.start_login(&mut state)
            }
        };

        pending.await
    }

    /// Re-login after a caller saw an expired session
    ///
    /// `observed_generation` is the generation the caller read before issuing
    /// the request that came back expired. If a login has completed since
    /// then, the session is already new and no login is started.
    pub async fn reauthenticate(&self, observed_generation: u64) -> bool {
        let pending = {
            let mut state = self.inner.state.lock().await;
            if let Some(pending) = &state.pending {
                debug!("Joining in-flight login after session expiry");
                pending.clone()
            } else if state.generation > observed_generation
                && state.phase == SessionPhase::Authenticated
            {
                debug!(
                    "Session already refreshed (generation {} > {})",
                    state.generation, observed_generation
                );
                return true;
            } else {
                self.start_login(&mut state)
            }
        };

        pending.await
    }

    /// Force a new login regardless of session age
    pub async fn force_refresh(&self) -> bool {
        let pending = {
            let mut state = self.inner.state.lock().await;
            match &state.pending {
                Some(pending) => pending.clone(),
                None => self.start_login(&mut state),
            }
        };

        pending.await
    }

    /// Force a login if the refresh interval has elapsed since the last one
    ///
    /// Returns `None` when no refresh was due.
    pub async fn refresh_if_due(&self) -> Option<bool> {
        let pending = {
            let mut state = self.inner.state.lock().await;
            if !state.refresh_due(Utc::now(), self.inner.config.refresh_interval) {
                return None;
            }
            match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    info!("Session refresh interval elapsed, forcing login");
                    self.start_login(&mut state)
                }
            }
        };

        Some(pending.await)
    }

    /// Number of successful logins so far
    pub async fn generation(&self) -> u64 {
        self.inner.state.lock().await.generation
    }

    /// Diagnostic copy of the current state
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Run the periodic refresh loop until shutdown is broadcast
    pub fn spawn_refresh_loop(&self, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(coordinator.inner.config.refresh_check_interval);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Some(false) = coordinator.refresh_if_due().await {
                            warn!("Scheduled session refresh failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Session refresh loop received shutdown signal");
                        break;
                    }
                }
            }
        })
    }

    /// Spawn a login and record it as the in-flight attempt
    ///
    /// Must be called with the state lock held and no login pending.
    fn start_login(&self, state: &mut SessionState) -> PendingLogin {
        let inner = Arc::clone(&self.inner);
        let attempt = state.login_attempts + 1;
        debug!("Starting login attempt {}", attempt);

        let handle = tokio::spawn(async move {
            let timeout = inner.config.login_timeout;
            let success = match tokio::time::timeout(timeout, inner.login.login()).await {
                Ok(Ok(())) => {
                    info!("Login attempt {} succeeded", attempt);
                    true
                }
                Ok(Err(e)) => {
                    warn!("Login attempt {} failed: {}", attempt, e);
                    false
                }
                Err(_) => {
                    warn!("Login attempt {} timed out after {:?}", attempt, timeout);
                    false
                }
            };

            inner.state.lock().await.complete_login(success, Utc::now());
            success
        });

        let inner = Arc::clone(&self.inner);
        let pending = async move {
            match handle.await {
                Ok(success) => success,
                Err(e) => {
                    warn!("Login task aborted: {}", e);
                    inner.state.lock().await.complete_login(false, Utc::now());
                    false
                }
            }
        }
        .boxed()
        .shared();

        state.begin_login(pending.clone());
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AuthError, AuthResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingLogin {
        calls: AtomicUsize,
        succeed: bool,
        delay: Duration,
    }

    impl CountingLogin {
        fn new(succeed: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                succeed,
                delay,
            })
        }
    }

    #[async_trait]
    impl LoginProtocol for CountingLogin {
        async fn login(&self) -> AuthResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.succeed {
                Ok(())
            } else {
                Err(AuthError::PrimaryLoginFailed { status: 401 })
            }
        }
    }

    #[tokio::test]
    async fn test_fresh_session_skips_login() {
        let login = CountingLogin::new(true, Duration::ZERO);
        let coordinator = SessionCoordinator::new(login.clone(), SessionConfig::default());

        assert!(coordinator.wait_until_authenticated().await);
        assert!(coordinator.wait_until_authenticated().await);
        assert_eq!(login.calls.load(Ordering::SeqCst), 1);

        let snapshot = coordinator.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Authenticated);
        assert_eq!(snapshot.generation, 1);
        assert!(snapshot.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_stale_session_logs_in_again() {
        let login = CountingLogin::new(true, Duration::ZERO);
        let config = SessionConfig::default().with_refresh_interval(Duration::from_millis(20));
        let coordinator = SessionCoordinator::new(login.clone(), config);

        assert!(coordinator.wait_until_authenticated().await);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(coordinator.wait_until_authenticated().await);
        assert_eq!(login.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reauthenticate_coalesces_on_generation() {
        let login = CountingLogin::new(true, Duration::ZERO);
        let coordinator = SessionCoordinator::new(login.clone(), SessionConfig::default());

        assert!(coordinator.wait_until_authenticated().await);
        let observed = coordinator.generation().await;

        assert!(coordinator.reauthenticate(observed).await);
        assert_eq!(login.calls.load(Ordering::SeqCst), 2);

        // A second caller that observed the old generation finds the session renewed
        assert!(coordinator.reauthenticate(observed).await);
        assert_eq!(login.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_login_timeout_is_failure() {
        let login = CountingLogin::new(true, Duration::from_millis(200));
        let config = SessionConfig::default().with_login_timeout(Duration::from_millis(20));
        let coordinator = SessionCoordinator::new(login.clone(), config);

        assert!(!coordinator.wait_until_authenticated().await);
        let snapshot = coordinator.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Unauthenticated);
        assert_eq!(snapshot.login_failures, 1);
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_cancel_login() {
        let login = CountingLogin::new(true, Duration::from_millis(30));
        let coordinator = SessionCoordinator::new(login.clone(), SessionConfig::default());

        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.wait_until_authenticated().await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.abort();

        tokio::time::sleep(Duration::from_millis(60)).await;
        let snapshot = coordinator.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Authenticated);
        assert_eq!(login.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_if_due() {
        let login = CountingLogin::new(true, Duration::ZERO);
        let coordinator = SessionCoordinator::new(login.clone(), SessionConfig::default());

        assert_eq!(coordinator.refresh_if_due().await, Some(true));
        assert_eq!(coordinator.refresh_if_due().await, None);
        assert_eq!(login.calls.load(Ordering::SeqCst), 1);

        assert!(coordinator.force_refresh().await);
        assert_eq!(login.calls.load(Ordering::SeqCst), 2);
    }
}
