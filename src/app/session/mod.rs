//! Shared session lifecycle
//!
//! - `config`: refresh and login timing
//! - `state`: phase, last login, generation and the in-flight login
//! - `coordinator`: single-flight login, expiry recovery and the refresh loop

pub mod config;
pub mod coordinator;
pub mod state;

pub use config::SessionConfig;
pub use coordinator::SessionCoordinator;
pub use state::{PendingLogin, SessionPhase, SessionSnapshot, SessionState};
