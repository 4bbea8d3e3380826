//! Report parsing contract and shared heuristics
//!
//! Every concrete report implements [`ReportParser`] against one page layout.
//! The helpers here are plain functions consumed by those implementations:
//!
//! - [`columns`] - ordered header rules and the column map they produce
//! - [`rows`] - table location and row-level fault isolation
//! - [`text`] - whitespace normalization, first-integer and countback extraction
//! - [`score`] - gross/relative-to-par conversion
//! - [`links`] - caller-supplied link annotations

use std::collections::BTreeMap;

use scraper::Html;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod columns;
pub mod links;
pub mod rows;
pub mod score;
pub mod text;

pub use columns::{ColumnMap, ColumnRule, ColumnRules, HeaderCell};
pub use links::{apply_links, HasLinks, Link};
pub use rows::{locate_table, parse_rows, parse_table, RowCells, TableLayout};

/// Turns one report page into typed records
///
/// Parsing is synchronous and never fails as a whole: structural problems
/// produce an empty vector and bad rows are skipped, both with a log line.
pub trait ReportParser: Send + Sync {
    /// Record type produced per data row
    type Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Short report name used in logs
    fn name(&self) -> &'static str;

    /// Parse a page into records
    fn parse_report(&self, document: &Html, metadata: Option<&ParseMetadata>)
        -> Vec<Self::Record>;
}

/// Par per tee, keyed like `gents.white`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseParTable {
    pars: BTreeMap<String, i32>,
}

impl CourseParTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the par of a tee
    pub fn insert(&mut self, tee: impl AsRef<str>, par: i32) {
        self.pars.insert(normalize_tee(tee.as_ref()), par);
    }

    pub fn with_par(mut self, tee: impl AsRef<str>, par: i32) -> Self {
        self.insert(tee, par);
        self
    }

    pub fn len(&self) -> usize {
        self.pars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pars.is_empty()
    }

    /// Par for a tee name, matching the full key or its last segment
    pub fn get(&self, tee: &str) -> Option<i32> {
        let tee = normalize_tee(tee);
        if tee.is_empty() {
            return None;
        }
        if let Some(par) = self.pars.get(&tee) {
            return Some(*par);
        }
        let suffix = format!(".{}", tee);
        self.pars
            .iter()
            .find(|(key, _)| key.ends_with(&suffix))
            .map(|(_, par)| *par)
    }

    /// The par when only one tee is known
    pub fn single(&self) -> Option<i32> {
        if self.pars.len() == 1 {
            self.pars.values().next().copied()
        } else {
            None
        }
    }
}

impl<S: AsRef<str>> FromIterator<(S, i32)> for CourseParTable {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (tee, par) in iter {
            table.insert(tee, par);
        }
        table
    }
}

fn normalize_tee(tee: &str) -> String {
    tee.trim().to_lowercase()
}

/// Extra context some parsers need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub course_pars: CourseParTable,
    /// Tee assumed for rows that do not name one
    pub default_tee: Option<String>,
}

impl ParseMetadata {
    pub fn with_course_pars(course_pars: CourseParTable) -> Self {
        Self {
            course_pars,
            default_tee: None,
        }
    }

    pub fn with_default_tee(mut self, tee: impl Into<String>) -> Self {
        self.default_tee = Some(tee.into());
        self
    }

    /// Par for a row: its own tee, then the default tee, then a lone entry
    pub fn course_par_for(&self, row_tee: Option<&str>) -> Option<i32> {
        row_tee
            .and_then(|tee| self.course_pars.get(tee))
            .or_else(|| {
                self.default_tee
                    .as_deref()
                    .and_then(|tee| self.course_pars.get(tee))
            })
            .or_else(|| self.course_pars.single())
    }
}
