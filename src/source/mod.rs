//! Feed sources: fetching raw content and parsing it into [`JobEntry`]s.
//!
//! Fetching goes through the [`HttpFetch`] capability so the rest of the
//! pipeline can be exercised with canned bytes. Parsing is dispatched on the
//! source's [`FeedKind`]:
//!
//! * [`FeedKind::Syndication`] — RSS 2.0 via the [`rss`](::rss) crate, then
//!   Atom / RSS 1.0 / JSON Feed via `feed-rs` as a fallback.
//! * [`FeedKind::RemoteOk`] — the RemoteOK JSON API.
//!
//! Both stages are best-effort: a source that fails to fetch or parse is
//! logged and contributes no entries; the others carry on.

mod atom;
mod http;
mod job_entry;
mod remoteok;
mod rss;

pub use http::HttpFetcher;
pub use job_entry::JobEntry;

use std::fmt;

use tracing::{debug, warn};

use crate::error::{FetchError, ParseError};

/// How a source's payload is structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Syndication,
    RemoteOk,
}

/// One feed to poll. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub kind: FeedKind,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, kind: FeedKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Raw bytes of one successfully fetched source.
pub type RawContent = Vec<u8>;

/// Capability to GET a URL. Implementations bound the request time.
pub trait HttpFetch {
    fn get(&self, url: &url::Url) -> Result<RawContent, FetchError>;
}

/// Check a source URL before any request is made.
pub fn validate_url(raw: &str) -> Result<url::Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme {scheme}"))),
    }
    if parsed.host().is_none() {
        return Err(invalid("no host".to_string()));
    }
    Ok(parsed)
}

/// Fetch every source in order, one at a time.
///
/// Each source gets its own result; a failure never stops the loop.
pub fn fetch_all<'a>(
    sources: &'a [FeedSource],
    http: &dyn HttpFetch,
) -> Vec<(&'a FeedSource, Result<RawContent, FetchError>)> {
    sources
        .iter()
        .map(|source| {
            let result = validate_url(&source.url).and_then(|url| http.get(&url));
            match &result {
                Ok(raw) => debug!(source = %source, bytes = raw.len(), "fetch ok"),
                Err(e) => warn!(source = %source, error = %e, "fetch failed, skipping"),
            }
            (source, result)
        })
        .collect()
}

/// Parse one source's raw content according to its kind.
pub fn parse(source: &FeedSource, raw: &[u8]) -> Result<Vec<JobEntry>, ParseError> {
    match source.kind {
        FeedKind::RemoteOk => remoteok::parse(raw),
        FeedKind::Syndication => match rss::read_channel(raw) {
            Ok(channel) => Ok(rss::parse_channel(&channel)),
            Err(rss_err) => atom::parse(raw).map_err(|fallback| ParseError::UnrecognizedFormat {
                rss: rss_err.to_string(),
                fallback: fallback.to_string(),
            }),
        },
    }
}

/// Parse one source, logging and swallowing failures.
pub fn parse_or_skip(source: &FeedSource, raw: &[u8]) -> Vec<JobEntry> {
    match parse(source, raw) {
        Ok(entries) => {
            debug!(source = %source, entries = entries.len(), "parsed");
            entries
        }
        Err(e) => {
            warn!(source = %source, error = %e, "malformed feed, skipping");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
