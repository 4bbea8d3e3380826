//! Member list report

use once_cell::sync::Lazy;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::app::parser::text::first_digits;
use crate::app::parser::{
    parse_table, ColumnMap, ColumnRule, ColumnRules, HasLinks, Link, ParseMetadata, ReportParser,
    RowCells,
};
use crate::errors::{ParseError, ParseResult};

/// One member of the club
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: Option<String>,
    pub name: String,
    pub handicap: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl HasLinks for MemberRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

pub fn member_rules() -> ParseResult<ColumnRules> {
    Ok(ColumnRules::new(vec![
        ColumnRule::new(
            r"^(member ?id|membership ?(no\.?|number)|id|no\.?)$",
            &[("member_id", 0)],
        )?,
        ColumnRule::new(r"^(name|member|member name|full name)$", &[("name", 0)])?,
        ColumnRule::new(
            r"^(h['/]?cap|handicap|hcp|handicap index|index)$",
            &[("handicap", 0)],
        )?,
        ColumnRule::new(
            r"^(category|cat|membership|membership type|type)$",
            &[("category", 0)],
        )?,
    ]))
}

static RULES: Lazy<ColumnRules> = Lazy::new(|| member_rules().expect("static member rules"));

const REQUIRED: &[&str] = &["name"];

/// Parser for the member list
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberListParser;

impl MemberListParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_row(cells: &RowCells<'_>, columns: &ColumnMap) -> ParseResult<Option<MemberRecord>> {
        let name = cells
            .field_text(columns, "name")
            .ok_or(ParseError::MissingField { field: "name" })?;

        let member_id = cells
            .field_text(columns, "member_id")
            .and_then(|text| first_digits(&text).map(str::to_string))
            .or_else(|| {
                columns
                    .get("name")
                    .and_then(|column| cells.member_id(column))
            });

        Ok(Some(MemberRecord {
            member_id,
            name,
            handicap: cells.field_text(columns, "handicap"),
            category: cells.field_text(columns, "category"),
            links: Vec::new(),
        }))
    }
}

impl ReportParser for MemberListParser {
    type Record = MemberRecord;

    fn name(&self) -> &'static str {
        "members"
    }

    fn parse_report(
        &self,
        document: &Html,
        _metadata: Option<&ParseMetadata>,
    ) -> Vec<MemberRecord> {
        parse_table(document, &RULES, REQUIRED, self.name(), Self::parse_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_list() {
        let markup = r#"<table>
            <tr><th>Membership No.</th><th>Name</th><th>Handicap Index</th><th>Category</th></tr>
            <tr><td>M0042</td><td>Smith, Jane</td><td>14.2</td><td>Full</td></tr>
            <tr><td></td><td><a href="/members/view.php?memberid=77">Jones, Tom</a></td><td>+0.4</td><td>Junior</td></tr>
            <tr><td>99</td><td></td><td>3.0</td><td>Full</td></tr>
        </table>"#;
        let records = MemberListParser::new().parse_report(&Html::parse_document(markup), None);

        // Third row has no name and is skipped
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].member_id.as_deref(), Some("0042"));
        assert_eq!(records[0].handicap.as_deref(), Some("14.2"));
        assert_eq!(records[1].member_id.as_deref(), Some("77"));
        assert_eq!(records[1].category.as_deref(), Some("Junior"));
    }
}
