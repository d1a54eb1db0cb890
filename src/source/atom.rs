//! Fallback parsing for everything that is not RSS 2.0.
//!
//! Atom, RSS 1.0 and JSON Feed documents go through [`feed_rs`].

use feed_rs::model::{Entry, Link};

use super::JobEntry;

/// Parse raw bytes with `feed-rs`.
pub fn parse(raw: &[u8]) -> Result<Vec<JobEntry>, feed_rs::parser::ParseFeedError> {
    let feed = feed_rs::parser::parse(raw)?;
    Ok(feed.entries.iter().filter_map(to_entry).collect())
}

fn to_entry(entry: &Entry) -> Option<JobEntry> {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_default();

    let summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default();

    JobEntry::new(
        title,
        primary_link(&entry.links).map(|l| l.href.as_str()),
        summary,
        entry.published.or(entry.updated),
    )
}

/// The `alternate` link (or one without a rel), else the first one.
fn primary_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
}
