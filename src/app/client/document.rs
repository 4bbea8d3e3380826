//! Fetched report documents
//!
//! A report body arrives either as plain HTML or as a JSON envelope whose
//! `actions[].html` fields carry the markup. `ReportDocument` normalizes both
//! into one markup string and records the page title for login detection.
//!
//! The markup is kept as a `String` and parsed into a `scraper::Html` on demand,
//! because the parsed tree is not `Send` and must not live across an await.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::errors::{FetchError, FetchResult};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static title selector"));

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    actions: Vec<EnvelopeAction>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeAction {
    #[serde(default)]
    html: Option<String>,
}

/// A report page ready for parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    markup: String,
    title: Option<String>,
}

impl ReportDocument {
    /// Decode a response body into a document
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Envelope` if a JSON body is malformed and
    /// `FetchError::EmptyEnvelope` if it carries no markup.
    pub fn from_body(body: &str) -> FetchResult<Self> {
        let trimmed = body.trim_start();
        if trimmed.starts_with('{') {
            let envelope: Envelope = serde_json::from_str(trimmed)?;
            let markup: String = envelope
                .actions
                .into_iter()
                .filter_map(|action| action.html)
                .collect::<Vec<_>>()
                .join("\n");
            if markup.trim().is_empty() {
                return Err(FetchError::EmptyEnvelope);
            }
            return Ok(Self::from_markup(markup));
        }
        Ok(Self::from_markup(body.to_string()))
    }

    /// Wrap markup that is already known to be HTML
    pub fn from_markup(markup: String) -> Self {
        let title = extract_title(&markup);
        Self { markup, title }
    }

    /// Raw markup
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Trimmed `<title>` text, if the page has one
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Whether the title carries the login-required marker
    pub fn requires_login(&self, marker: &str) -> bool {
        let marker = marker.trim().to_lowercase();
        if marker.is_empty() {
            return false;
        }
        self.title
            .as_deref()
            .map(|title| title.to_lowercase().contains(&marker))
            .unwrap_or(false)
    }

    /// Parse the markup into a DOM tree
    pub fn html(&self) -> Html {
        Html::parse_document(&self.markup)
    }

    /// Snapshot suitable for the raw cache tier
    pub fn snapshot(&self) -> RawSnapshot {
        RawSnapshot {
            markup: self.markup.clone(),
            fetched_at: Utc::now(),
        }
    }
}

/// Serialized page body kept in the raw fallback cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Page markup as fetched
    pub markup: String,
    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawSnapshot {
    /// Rebuild a document from the snapshot
    ///
    /// Returns `None` if the snapshot is blank, which callers treat as a miss.
    pub fn into_document(self) -> Option<ReportDocument> {
        if self.markup.trim().is_empty() {
            return None;
        }
        Some(ReportDocument::from_markup(self.markup))
    }
}

fn extract_title(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| {
            title
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|title| !title.is_empty())
}
