//! Core application logic for IG Fetcher
//!
//! This module contains the report acquisition pipeline: the HTTP session and
//! login protocol, the single-flight session coordinator, the two-tier cache,
//! the parsing framework with its concrete reports, and the orchestrator that
//! composes them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ig_fetcher::app::{AcquireOptions, LeaderboardParser, ReportOrchestrator, ReportRequest};
//! use ig_fetcher::auth::Credentials;
//! use ig_fetcher::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let orchestrator = ReportOrchestrator::from_config(&config, Credentials::from_env()?)?;
//!
//! let request = ReportRequest::get("/competition.php?compid=1234&tab=leaderboard");
//! let options = AcquireOptions::cached("leaderboard:1234");
//! let entries = orchestrator
//!     .get_data(&request, &LeaderboardParser::new(), &options)
//!     .await?;
//!
//! for entry in entries {
//!     println!("{} {} {:?}", entry.position_text, entry.name, entry.par);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod orchestrator;
pub mod parser;
pub mod reports;
pub mod session;

// Re-export main public API
pub use cache::{CacheConfig, CacheLayers, CacheStatsSnapshot, CacheStore, MemoryCacheStore};
pub use client::{
    ClientConfig, FetchGateway, HttpHandler, HttpMethod, LoginProtocol, ReportDocument,
    ReportRequest, SessionContext, SiteConfig, StepUpLogin, Transport, TransportResponse,
};
pub use orchestrator::{AcquireOptions, BackgroundTaskManager, CacheControl, ReportOrchestrator};
pub use parser::{CourseParTable, Link, ParseMetadata, ReportParser};
pub use reports::{
    CompetitionResult, CompetitionResultsParser, LeaderboardEntry, LeaderboardParser,
    MemberListParser, MemberRecord, ReportKind,
};
pub use session::{SessionConfig, SessionCoordinator, SessionPhase, SessionSnapshot};
