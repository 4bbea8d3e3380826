//! Cell text normalization and tolerant value extraction

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::constants::parsing;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static integer regex"));

static COUNTBACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)countback\s+results\s*:\s*([^<"\r\n]*)"#).expect("static countback regex")
});

/// Collapse whitespace (including non-breaking spaces) and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Header text as matched by column rules: cleaned and lower-cased
pub fn normalize_header(text: &str) -> String {
    clean_text(text).to_lowercase()
}

/// Cleaned text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Logical column span of a cell, between 1 and `MAX_COLSPAN`
pub fn colspan(element: &ElementRef<'_>) -> usize {
    let Some(span) = element.value().attr("colspan").map(str::trim) else {
        return 1;
    };
    if span.is_empty() || !span.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    // Digits too long for usize are still a span past the limit
    let span = span.parse::<usize>().unwrap_or(parsing::MAX_COLSPAN);
    span.clamp(1, parsing::MAX_COLSPAN)
}

/// First run of digits in `text`, ignoring ordinal suffixes and footnotes
pub fn first_integer(text: &str) -> Option<u32> {
    FIRST_INTEGER
        .find(text)
        .and_then(|digits| digits.as_str().parse().ok())
}

/// First run of digits in `text`, as written
pub fn first_digits(text: &str) -> Option<&str> {
    FIRST_INTEGER.find(text).map(|digits| digits.as_str())
}

/// Tie-break value following a `Countback Results:` annotation
pub fn extract_countback(text: &str) -> Option<String> {
    COUNTBACK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Cell text with any trailing countback annotation removed
pub fn without_countback(text: &str) -> String {
    match COUNTBACK.find(text) {
        Some(annotation) => clean_text(&text[..annotation.start()]),
        None => clean_text(text),
    }
}

/// Shorten markup for log lines without splitting a character
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// `Some(text)` unless the cleaned text is empty
pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
