//! Heuristic header-to-column mapping
//!
//! A report table is described by an ordered list of rules. Each rule pairs a
//! pattern over normalized header text with the fields it assigns, as offsets
//! from the matching cell's column. Header cells are scanned left to right
//! with a running column index advanced by each cell's colspan; the first
//! rule matching a cell wins for that cell.
//!
//! A field mapped by one rule is only ever replaced by a strictly earlier
//! rule, so the rule order alone resolves ambiguous layouts.

use std::collections::HashMap;

use regex::Regex;
use scraper::ElementRef;

use super::text::{colspan, element_text, normalize_header};
use crate::constants::parsing;
use crate::errors::ParseResult;

/// One header cell as seen by the mapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    /// Normalized (cleaned, lower-cased) text
    pub text: String,
    /// Logical columns spanned
    pub colspan: usize,
}

impl HeaderCell {
    pub fn new(text: &str, colspan: usize) -> Self {
        Self {
            text: normalize_header(text),
            colspan: colspan.clamp(1, parsing::MAX_COLSPAN),
        }
    }

    pub fn from_element(cell: &ElementRef<'_>) -> Self {
        Self::new(&element_text(cell), colspan(cell))
    }
}

/// A pattern and the fields it assigns
#[derive(Debug, Clone)]
pub struct ColumnRule {
    pattern: Regex,
    assignments: Vec<(&'static str, isize)>,
}

impl ColumnRule {
    /// Compile a rule
    ///
    /// Offsets are relative to the first column of the matching cell.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidPattern` if the pattern does not compile.
    pub fn new(pattern: &str, assignments: &[(&'static str, isize)]) -> ParseResult<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            assignments: assignments.to_vec(),
        })
    }

    pub fn matches(&self, header: &str) -> bool {
        self.pattern.is_match(header)
    }

    pub fn assignments(&self) -> &[(&'static str, isize)] {
        &self.assignments
    }
}

/// Ordered rule table; earlier rules take precedence
#[derive(Debug, Clone, Default)]
pub struct ColumnRules {
    rules: Vec<ColumnRule>,
}

impl ColumnRules {
    pub fn new(rules: Vec<ColumnRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Build the column map for one header row
    pub fn map_headers(&self, headers: &[HeaderCell]) -> ColumnMap {
        let mut map = ColumnMap::default();
        let mut column = 0usize;

        for header in headers {
            let matched = self
                .rules
                .iter()
                .enumerate()
                .find(|(_, rule)| rule.matches(&header.text));

            if let Some((priority, rule)) = matched {
                for &(field, offset) in rule.assignments() {
                    if let Some(target) = column.checked_add_signed(offset) {
                        map.assign(field, target, priority);
                    }
                }
            }

            column = column.saturating_add(header.colspan);
        }

        map
    }
}

/// Field name to zero-based column index for one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    /// field -> (column, priority of the rule that mapped it)
    fields: HashMap<&'static str, (usize, usize)>,
}

impl ColumnMap {
    fn assign(&mut self, field: &'static str, column: usize, priority: usize) {
        match self.fields.get(field) {
            Some((_, existing)) if *existing <= priority => {}
            _ => {
                self.fields.insert(field, (column, priority));
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<usize> {
        self.fields.get(field).map(|(column, _)| *column)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn contains_all(&self, fields: &[&str]) -> bool {
        fields.iter().all(|field| self.contains(field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Mapped fields ordered by column
    pub fn fields(&self) -> Vec<(&'static str, usize)> {
        let mut fields: Vec<_> = self
            .fields
            .iter()
            .map(|(field, (column, _))| (*field, *column))
            .collect();
        fields.sort_by_key(|(field, column)| (*column, *field));
        fields
    }
}
