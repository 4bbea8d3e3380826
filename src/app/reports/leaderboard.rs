//! Competition leaderboard report
//!
//! Leaderboards come in several layouts: a title cell ("Gross Leaderboard")
//! or a "Result" cell heading the position column with the player in the next
//! column, or explicit Pos/Name headers. The score columns vary as well; a
//! row may carry a gross score, a relative-to-par token or both, and the
//! missing one is derived from the course par of the tee played.

use once_cell::sync::Lazy;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::app::parser::score::derive_missing;
use crate::app::parser::text::{extract_countback, first_integer, without_countback};
use crate::app::parser::{
    parse_table, ColumnMap, ColumnRule, ColumnRules, HasLinks, Link, ParseMetadata, ReportParser,
    RowCells,
};
use crate::errors::{ParseError, ParseResult};

/// One player's line on a leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Numeric position, if the position cell has one
    pub position: Option<u32>,
    /// Position as shown, e.g. "T3"
    pub position_text: String,
    pub name: String,
    pub member_id: Option<String>,
    pub score: Option<String>,
    /// Relative-to-par token, e.g. "+3" or "LEVEL"
    pub par: Option<String>,
    pub gross: Option<i32>,
    pub thru: Option<String>,
    pub tee: Option<String>,
    pub countback: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl HasLinks for LeaderboardEntry {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

/// Header rules, highest precedence first
///
/// `par` is listed before `status` so a table with both keeps the par column.
pub fn leaderboard_rules() -> ParseResult<ColumnRules> {
    Ok(ColumnRules::new(vec![
        ColumnRule::new(
            r"^(gross |nett |net |stableford )?leaderboard$",
            &[("position", 0), ("name", 1)],
        )?,
        ColumnRule::new(r"^results?$", &[("position", 0), ("name", 1)])?,
        ColumnRule::new(r"^(pos\.?|position|place)$", &[("position", 0)])?,
        ColumnRule::new(r"^(name|player|competitor|member)$", &[("name", 0)])?,
        ColumnRule::new(r"^(par|to par|vs par|\+/-)$", &[("par", 0)])?,
        ColumnRule::new(r"^status$", &[("par", 0)])?,
        ColumnRule::new(r"^(thru|holes|played)$", &[("thru", 0)])?,
        ColumnRule::new(r"^gross$", &[("gross", 0)])?,
        ColumnRule::new(
            r"^(score|total|nett|net|points|pts|stableford)$",
            &[("score", 0)],
        )?,
        ColumnRule::new(r"^tee$", &[("tee", 0)])?,
        ColumnRule::new(r"^(countback|c/b|cb)$", &[("countback", 0)])?,
    ]))
}

static RULES: Lazy<ColumnRules> =
    Lazy::new(|| leaderboard_rules().expect("static leaderboard rules"));

const REQUIRED: &[&str] = &["position", "name"];

/// Parser for competition leaderboards
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderboardParser;

impl LeaderboardParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_row(
        cells: &RowCells<'_>,
        columns: &ColumnMap,
        metadata: Option<&ParseMetadata>,
    ) -> ParseResult<Option<LeaderboardEntry>> {
        let name = cells
            .field_text(columns, "name")
            .ok_or(ParseError::MissingField { field: "name" })?;
        let position_text = cells.field_text(columns, "position").unwrap_or_default();
        let member_id = columns
            .get("name")
            .and_then(|column| cells.member_id(column));

        let score_text = cells.field_text(columns, "score");
        let countback = cells
            .field_text(columns, "countback")
            .or_else(|| {
                cells
                    .field_html(columns, "score")
                    .and_then(|html| extract_countback(&html))
            })
            .or_else(|| extract_countback(&cells.row_html()));
        let score = score_text
            .map(|text| without_countback(&text))
            .filter(|text| !text.is_empty());

        let tee = cells.field_text(columns, "tee");
        let mut par = cells.field_text(columns, "par");
        let mut gross = cells
            .field_text(columns, "gross")
            .and_then(|text| first_integer(&text))
            .and_then(|gross| i32::try_from(gross).ok());

        let course_par = metadata.and_then(|metadata| metadata.course_par_for(tee.as_deref()));
        derive_missing(&mut gross, &mut par, course_par);

        Ok(Some(LeaderboardEntry {
            position: first_integer(&position_text),
            position_text,
            name,
            member_id,
            score,
            par,
            gross,
            thru: cells.field_text(columns, "thru"),
            tee,
            countback,
            links: Vec::new(),
        }))
    }
}

impl ReportParser for LeaderboardParser {
    type Record = LeaderboardEntry;

    fn name(&self) -> &'static str {
        "leaderboard"
    }

    fn parse_report(
        &self,
        document: &Html,
        metadata: Option<&ParseMetadata>,
    ) -> Vec<LeaderboardEntry> {
        parse_table(document, &RULES, REQUIRED, self.name(), |cells, columns| {
            Self::parse_row(cells, columns, metadata)
        })
    }
}
