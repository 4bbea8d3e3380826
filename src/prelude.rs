//! Prelude module for IG Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use ig_fetcher::prelude::*;` statement.

// Core result types
pub use crate::errors::{AppError, Result};

// Pipeline entry point and its options
pub use crate::app::{AcquireOptions, CacheControl, ReportOrchestrator, ReportRequest};

// Parsing contract and concrete reports
pub use crate::app::{
    CompetitionResult, CompetitionResultsParser, CourseParTable, LeaderboardEntry,
    LeaderboardParser, Link, MemberListParser, MemberRecord, ParseMetadata, ReportKind,
    ReportParser,
};

// Configuration and credentials
pub use crate::auth::Credentials;
pub use crate::config::AppConfig;
