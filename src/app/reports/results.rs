//! Competition results report

use once_cell::sync::Lazy;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::app::parser::text::{extract_countback, first_integer, without_countback};
use crate::app::parser::{
    parse_table, ColumnMap, ColumnRule, ColumnRules, HasLinks, Link, ParseMetadata, ReportParser,
    RowCells,
};
use crate::errors::{ParseError, ParseResult};

/// One finisher in a completed competition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub position: Option<u32>,
    pub position_text: String,
    pub name: String,
    pub member_id: Option<String>,
    pub handicap: Option<String>,
    pub score: Option<String>,
    pub countback: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl HasLinks for CompetitionResult {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

pub fn results_rules() -> ParseResult<ColumnRules> {
    Ok(ColumnRules::new(vec![
        ColumnRule::new(r"^results?$", &[("position", 0), ("name", 1)])?,
        ColumnRule::new(r"^(pos\.?|position|place)$", &[("position", 0)])?,
        ColumnRule::new(r"^(name|player|competitor|member)$", &[("name", 0)])?,
        ColumnRule::new(
            r"^(h['/]?cap|handicap|hcp|ph|playing handicap)$",
            &[("handicap", 0)],
        )?,
        ColumnRule::new(
            r"^(score|total|nett|net|points|pts|stableford|gross)$",
            &[("score", 0)],
        )?,
        ColumnRule::new(r"^(countback|c/b|cb)$", &[("countback", 0)])?,
    ]))
}

static RULES: Lazy<ColumnRules> = Lazy::new(|| results_rules().expect("static results rules"));

const REQUIRED: &[&str] = &["position", "name"];

/// Parser for competition result sheets
#[derive(Debug, Clone, Copy, Default)]
pub struct CompetitionResultsParser;

impl CompetitionResultsParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_row(
        cells: &RowCells<'_>,
        columns: &ColumnMap,
    ) -> ParseResult<Option<CompetitionResult>> {
        let name = cells
            .field_text(columns, "name")
            .ok_or(ParseError::MissingField { field: "name" })?;
        let position_text = cells.field_text(columns, "position").unwrap_or_default();

        let countback = cells.field_text(columns, "countback").or_else(|| {
            cells
                .field_html(columns, "score")
                .and_then(|html| extract_countback(&html))
        });
        let score = cells
            .field_text(columns, "score")
            .map(|text| without_countback(&text))
            .filter(|text| !text.is_empty());

        Ok(Some(CompetitionResult {
            position: first_integer(&position_text),
            position_text,
            name,
            member_id: columns
                .get("name")
                .and_then(|column| cells.member_id(column)),
            handicap: cells.field_text(columns, "handicap"),
            score,
            countback,
            links: Vec::new(),
        }))
    }
}

impl ReportParser for CompetitionResultsParser {
    type Record = CompetitionResult;

    fn name(&self) -> &'static str {
        "results"
    }

    fn parse_report(
        &self,
        document: &Html,
        _metadata: Option<&ParseMetadata>,
    ) -> Vec<CompetitionResult> {
        parse_table(document, &RULES, REQUIRED, self.name(), Self::parse_row)
    }
}
