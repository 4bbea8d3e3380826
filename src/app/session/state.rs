//! Session lifecycle state
//!
//! `SessionState` is created once per coordinator and only ever mutated while
//! the coordinator's mutex is held.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use serde::Serialize;

/// A login attempt that any number of callers can await
pub type PendingLogin = Shared<BoxFuture<'static, bool>>;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No successful login yet, or the last attempt failed
    Unauthenticated,
    /// A login attempt is in flight
    Authenticating,
    /// The last login succeeded
    Authenticated,
}

/// Point-in-time copy of the session state for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub last_login_at: Option<DateTime<Utc>>,
    pub generation: u64,
    pub login_attempts: u64,
    pub login_failures: u64,
}

impl SessionSnapshot {
    /// Whether the session is currently usable
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }
}

/// Mutable state owned by the session coordinator
pub struct SessionState {
    pub(crate) phase: SessionPhase,
    pub(crate) last_login_at: Option<DateTime<Utc>>,
    /// Incremented on every successful login
    pub(crate) generation: u64,
    pub(crate) pending: Option<PendingLogin>,
    pub(crate) login_attempts: u64,
    pub(crate) login_failures: u64,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("phase", &self.phase)
            .field("last_login_at", &self.last_login_at)
            .field("generation", &self.generation)
            .field("login_in_flight", &self.pending.is_some())
            .field("login_attempts", &self.login_attempts)
            .field("login_failures", &self.login_failures)
            .finish()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            last_login_at: None,
            generation: 0,
            pending: None,
            login_attempts: 0,
            login_failures: 0,
        }
    }

    /// Time since the last successful login, if any
    pub fn session_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_login_at
            .map(|at| (now - at).to_std().unwrap_or(Duration::ZERO))
    }

    /// Authenticated and younger than `refresh_interval`
    pub fn is_fresh(&self, now: DateTime<Utc>, refresh_interval: Duration) -> bool {
        self.phase == SessionPhase::Authenticated
            && self
                .session_age(now)
                .map(|age| age < refresh_interval)
                .unwrap_or(false)
    }

    /// Whether the refresh loop should force a login now
    pub fn refresh_due(&self, now: DateTime<Utc>, refresh_interval: Duration) -> bool {
        match self.session_age(now) {
            Some(age) => age >= refresh_interval,
            None => true,
        }
    }

    /// Mark a login as started
    pub(crate) fn begin_login(&mut self, pending: PendingLogin) {
        self.phase = SessionPhase::Authenticating;
        self.login_attempts += 1;
        self.pending = Some(pending);
    }

    /// Publish the outcome of the in-flight login and clear it
    pub(crate) fn complete_login(&mut self, success: bool, now: DateTime<Utc>) {
        self.pending = None;
        if success {
            self.phase = SessionPhase::Authenticated;
            self.last_login_at = Some(now);
            self.generation += 1;
        } else {
            self.phase = SessionPhase::Unauthenticated;
            self.login_failures += 1;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            last_login_at: self.last_login_at,
            generation: self.generation,
            login_attempts: self.login_attempts,
            login_failures: self.login_failures,
        }
    }
}
