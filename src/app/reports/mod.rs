//! Concrete report parsers
//!
//! Each report is one [`ReportParser`](crate::app::parser::ReportParser)
//! implementation over the shared column and row helpers. [`ReportKind`]
//! names them for callers that select a report at runtime.

use std::fmt;
use std::str::FromStr;

pub mod leaderboard;
pub mod members;
pub mod results;

pub use leaderboard::{LeaderboardEntry, LeaderboardParser};
pub use members::{MemberListParser, MemberRecord};
pub use results::{CompetitionResult, CompetitionResultsParser};

/// Reports available by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Leaderboard,
    Results,
    Members,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [Self::Leaderboard, Self::Results, Self::Members];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leaderboard => "leaderboard",
            Self::Results => "results",
            Self::Members => "members",
        }
    }

    /// Cache key for a report request, derived from the kind and request
    pub fn cache_key(&self, url: &str, form: &[(String, String)]) -> String {
        let mut key = format!("{}:{}", self.as_str(), url.trim());
        for (name, value) in form {
            key.push_str(&format!("|{}={}", name, value));
        }
        key
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leaderboard" | "lb" => Ok(Self::Leaderboard),
            "results" | "result" => Ok(Self::Results),
            "members" | "member-list" => Ok(Self::Members),
            other => Err(format!(
                "unknown report '{}', expected one of: leaderboard, results, members",
                other
            )),
        }
    }
}
