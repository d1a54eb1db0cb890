//! RSS 2.0 parsing.
//!
//! Converts an [`::rss::Channel`] into [`JobEntry`] values. Items keep channel
//! order. An item's link is its `<link>`, else a permalink `<guid>`; items
//! with neither are dropped.

use chrono::{DateTime, Utc};

use super::JobEntry;

/// Parse raw bytes as an RSS 2.0 channel.
pub fn read_channel(raw: &[u8]) -> Result<::rss::Channel, ::rss::Error> {
    ::rss::Channel::read_from(raw)
}

/// Parse an already-read [`::rss::Channel`] into entries.
///
/// Pure function (no I/O) so the mapping can be tested without a network.
pub fn parse_channel(channel: &::rss::Channel) -> Vec<JobEntry> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            // RFC-2822 date; unparseable dates degrade to None.
            let published = item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
                .map(|dt| dt.with_timezone(&Utc));

            let link = item.link().or_else(|| {
                item.guid()
                    .filter(|g| g.is_permalink())
                    .map(|g| g.value())
            });

            JobEntry::new(
                item.title().unwrap_or_default(),
                link,
                item.description().unwrap_or_default(),
                published,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
