//! The normalised record every feed format is converted into.
//!
//! Format parsers (`rss`, `atom`, `remoteok`) build `JobEntry` values through
//! [`JobEntry::new`], which is the single place that enforces the identity
//! rule: an entry without a link is not an entry.

use chrono::{DateTime, Utc};

/// A single job listing, normalised from any feed format.
///
/// `link` is the identity key: deduplication, both within a run and across
/// runs through the seen registry, compares links and nothing else.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JobEntry {
    /// Posting headline. May be empty if the feed omitted it.
    pub title: String,

    /// Canonical URL of the posting, trimmed. Never empty.
    pub link: String,

    /// Description text as the feed delivered it (often HTML). May be empty.
    pub summary: String,

    /// Publication timestamp, if the feed provided a parseable one.
    pub published_at: Option<DateTime<Utc>>,
}

impl JobEntry {
    /// Build an entry, or `None` when the link is missing or blank.
    pub fn new(
        title: impl Into<String>,
        link: Option<&str>,
        summary: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let link = link.map(str::trim).filter(|l| !l.is_empty())?;
        Some(Self {
            title: title.into(),
            link: link.to_string(),
            summary: summary.into(),
            published_at,
        })
    }

    /// Lowercased `title + " " + summary`, the text keywords are matched in.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }
}
