//! Table location and row-isolated parsing
//!
//! Each data row is handed to the report's row parser on its own. A row that
//! fails is logged with a preview of its markup and skipped; the rest of the
//! table is still parsed.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::columns::{ColumnMap, ColumnRules, HeaderCell};
use super::text::{colspan, element_text, first_digits, non_empty, truncate_for_log};
use crate::constants::parsing;
use crate::errors::ParseResult;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("static selector"));
static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

static MEMBER_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:member)?id=(\d+)").expect("static member link regex"));

/// A located report table and its column map
#[derive(Debug, Clone)]
pub struct TableLayout<'a> {
    pub table: ElementRef<'a>,
    /// Index of the header row among the table's rows
    pub header_row: usize,
    pub columns: ColumnMap,
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Rows belonging to `table` itself, not to tables nested in its cells
pub fn table_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child_elements(child).filter(|row| row.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

/// `th` and `td` cells directly inside a row
fn row_cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(row).filter(|cell| matches!(cell.value().name(), "th" | "td"))
}

/// Header cells of one row, in document order
pub fn header_cells(row: &ElementRef<'_>) -> Vec<HeaderCell> {
    row_cells(*row)
        .map(|cell| HeaderCell::from_element(&cell))
        .collect()
}

/// Find the first table whose header maps every required field
///
/// Only the first few rows of each table are considered as header rows.
pub fn locate_table<'a>(
    document: &'a Html,
    rules: &ColumnRules,
    required: &[&str],
) -> Option<TableLayout<'a>> {
    for table in document.select(&TABLE) {
        for (index, row) in table_rows(table)
            .into_iter()
            .take(parsing::HEADER_SCAN_ROWS)
            .enumerate()
        {
            let columns = rules.map_headers(&header_cells(&row));
            if columns.contains_all(required) {
                debug!("Header row {} maps {:?}", index, columns.fields());
                return Some(TableLayout {
                    table,
                    header_row: index,
                    columns,
                });
            }
        }
    }
    None
}

/// Cells of one data row, expanded so each logical column has an entry
#[derive(Debug, Clone)]
pub struct RowCells<'a> {
    row: ElementRef<'a>,
    cells: Vec<ElementRef<'a>>,
}

impl<'a> RowCells<'a> {
    pub fn from_row(row: ElementRef<'a>) -> Self {
        let mut cells = Vec::new();
        for cell in row_cells(row) {
            for _ in 0..colspan(&cell) {
                cells.push(cell);
            }
        }
        Self { row, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, column: usize) -> Option<ElementRef<'a>> {
        self.cells.get(column).copied()
    }

    /// Cleaned text of a column, `None` if absent or blank
    pub fn text(&self, column: usize) -> Option<String> {
        self.cell(column)
            .and_then(|cell| non_empty(element_text(&cell)))
    }

    /// Inner markup of a column
    pub fn html(&self, column: usize) -> Option<String> {
        self.cell(column).map(|cell| cell.inner_html())
    }

    /// Cleaned text of the column mapped to `field`
    pub fn field_text(&self, columns: &ColumnMap, field: &str) -> Option<String> {
        columns.get(field).and_then(|column| self.text(column))
    }

    /// Inner markup of the column mapped to `field`
    pub fn field_html(&self, columns: &ColumnMap, field: &str) -> Option<String> {
        columns.get(field).and_then(|column| self.html(column))
    }

    /// Member identifier from a profile link in the column, else its first digits
    pub fn member_id(&self, column: usize) -> Option<String> {
        let cell = self.cell(column)?;
        let from_link = cell
            .select(&ANCHOR)
            .filter_map(|anchor| anchor.value().attr("href"))
            .find_map(|href| {
                MEMBER_LINK
                    .captures(href)
                    .and_then(|captures| captures.get(1))
                    .map(|id| id.as_str().to_string())
            });
        from_link.or_else(|| first_digits(&element_text(&cell)).map(str::to_string))
    }

    /// Whether every cell is blank
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| element_text(cell).is_empty())
    }

    /// Full row markup
    pub fn row_html(&self) -> String {
        self.row.html()
    }
}

/// Parse every data row below the header, isolating failures per row
///
/// The row parser returns `Ok(None)` for rows that carry no record (spacers,
/// sub-totals) and `Err` for rows it cannot read.
pub fn parse_rows<T, F>(layout: &TableLayout<'_>, report: &str, mut parse_row: F) -> Vec<T>
where
    F: FnMut(&RowCells<'_>, &ColumnMap) -> ParseResult<Option<T>>,
{
    let mut records = Vec::new();

    for (index, row) in table_rows(layout.table)
        .into_iter()
        .enumerate()
        .skip(layout.header_row + 1)
    {
        // Repeated header and section rows carry no data cells
        if !row_cells(row).any(|cell| cell.value().name() == "td") {
            continue;
        }

        let cells = RowCells::from_row(row);
        if cells.is_blank() {
            continue;
        }

        match parse_row(&cells, &layout.columns) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!(
                "Skipping {} row {}: {} | {}",
                report,
                index,
                e,
                truncate_for_log(&cells.row_html(), parsing::ROW_LOG_PREVIEW)
            ),
        }
    }

    records
}

/// Locate the report table and parse its rows
///
/// A missing table is logged and yields no records.
pub fn parse_table<T, F>(
    document: &Html,
    rules: &ColumnRules,
    required: &[&str],
    report: &str,
    parse_row: F,
) -> Vec<T>
where
    F: FnMut(&RowCells<'_>, &ColumnMap) -> ParseResult<Option<T>>,
{
    match locate_table(document, rules, required) {
        Some(layout) => {
            let records = parse_rows(&layout, report, parse_row);
            debug!("Parsed {} {} records", records.len(), report);
            records
        }
        None => {
            warn!(
                "No table matching the {} layout was found (required columns: {:?})",
                report, required
            );
            Vec::new()
        }
    }
}
