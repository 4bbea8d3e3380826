//! Authentication management for site credentials
//!
//! This module provides functions for managing the member id, PIN and admin
//! password used by the two-step login, including interactive setup,
//! verification, and secure storage in .env files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ig_fetcher::auth::{check_credentials, setup_credentials};
//! use ig_fetcher::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! if !check_credentials() {
//!     println!("Setting up credentials...");
//!     setup_credentials(&AppConfig::default()).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    check_credentials, get_auth_status, prompt_credentials, save_credentials,
    save_credentials_to, setup_credentials, show_auth_status, verify_credentials, AuthStatus,
    Credentials,
};
