//! IG Fetcher Library
//!
//! A Rust library for acquiring report data from a club-management web site
//! that offers no API. It logs in with a two-step member and admin login,
//! shares one session across concurrent callers, recovers from session
//! expiry, caches parsed and raw results, and parses loosely structured HTML
//! report tables into typed records.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
