//! HTTP side of the acquisition pipeline
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client and site configuration
//! - `session`: shared cookie-jar context and URL resolution
//! - `auth`: the two-step login protocol
//! - `http`: rate-limited transport for report requests
//! - `document`: body decoding and login-required detection
//! - `gateway`: fetch with a single coordinated re-login retry

pub mod auth;
pub mod config;
pub mod document;
pub mod gateway;
pub mod http;
pub mod session;

pub use auth::{LoginProtocol, StepUpLogin};
pub use config::{ClientConfig, SiteConfig};
pub use document::{RawSnapshot, ReportDocument};
pub use gateway::FetchGateway;
pub use http::{HttpHandler, HttpMethod, ReportRequest, Transport, TransportResponse};
pub use session::{resolve_url, SessionContext};
