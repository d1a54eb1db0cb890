//! RemoteOK JSON API.
//!
//! The endpoint returns a JSON array whose first element is a legal notice
//! rather than a posting, so anything that is not a posting object is skipped.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::JobEntry;
use crate::error::ParseError;

#[derive(Debug, Deserialize)]
struct Posting {
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    apply_url: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    epoch: Option<i64>,
}

pub fn parse(raw: &[u8]) -> Result<Vec<JobEntry>, ParseError> {
    let value: Value = serde_json::from_slice(raw)?;
    let Value::Array(items) = value else {
        return Err(ParseError::NotAnArray);
    };

    Ok(items
        .into_iter()
        .filter(|item| item.get("position").is_some() || item.get("title").is_some())
        .filter_map(|item| match serde_json::from_value::<Posting>(item) {
            Ok(posting) => Some(posting),
            Err(e) => {
                warn!(error = %e, "skipping malformed RemoteOK posting");
                None
            }
        })
        .filter_map(to_entry)
        .collect())
}

fn to_entry(p: Posting) -> Option<JobEntry> {
    let title = p.position.or(p.title).unwrap_or_default();

    let mut summary = p.description.unwrap_or_default();
    if let Some(company) = p.company.filter(|c| !c.trim().is_empty()) {
        if !summary.is_empty() {
            summary.push('\n');
        }
        summary.push_str("Company: ");
        summary.push_str(company.trim());
    }

    let published = p
        .date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| p.epoch.and_then(|s| DateTime::from_timestamp(s, 0)));

    let link = p
        .url
        .filter(|u| !u.trim().is_empty())
        .or(p.apply_url);

    JobEntry::new(title, link.as_deref(), summary, published)
}
