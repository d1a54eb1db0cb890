//! One run of the watcher.
//!
//! The stages run once, strictly in order:
//!
//! ```text
//! fetch ─► parse ─► filter ─► dedupe ─► notify ─► mark seen
//! ```
//!
//! Per-source fetch and parse failures are logged and skipped. A failed
//! notification fails the run and leaves the seen registry untouched; links
//! are recorded only after the message has been delivered.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::RunError;
use crate::filter::{self, KeywordSet, Match};
use crate::notify::{Notification, Notifier};
use crate::seen::SeenRegistry;
use crate::source::{self, FeedSource, HttpFetch, JobEntry};

/// How the run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing new matched; no message was sent.
    NothingNew,
    /// A message with this many jobs was delivered.
    Notified(usize),
    /// A message with this many jobs was printed, not sent.
    DryRun(usize),
}

/// Counters for the end-of-run log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub entries_parsed: usize,
    pub entries_matched: usize,
    pub entries_new: usize,
    pub outcome: Outcome,
    /// Set when delivery succeeded but the registry could not be saved.
    pub registry_error: Option<String>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sources {}/{} ok, {} parsed, {} matched, {} new",
            self.sources_ok,
            self.sources_ok + self.sources_failed,
            self.entries_parsed,
            self.entries_matched,
            self.entries_new
        )
    }
}

pub struct Pipeline<'a> {
    sources: Vec<FeedSource>,
    keywords: KeywordSet,
    fail_when_all_unreachable: bool,
    dry_run: bool,
    http: &'a dyn HttpFetch,
    notifier: &'a dyn Notifier,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &Config,
        http: &'a dyn HttpFetch,
        notifier: &'a dyn Notifier,
    ) -> Result<Self, RunError> {
        Ok(Self {
            sources: config.sources(),
            keywords: config.keyword_set()?,
            fail_when_all_unreachable: config.fetch.fail_when_all_unreachable,
            dry_run: false,
            http,
            notifier,
        })
    }

    /// Print instead of deliver, and leave the registry alone.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self, registry: &mut dyn SeenRegistry) -> Result<RunReport, RunError> {
        info!(sources = self.sources.len(), "fetching");
        let fetched = source::fetch_all(&self.sources, self.http);
        let sources_failed = fetched.iter().filter(|(_, r)| r.is_err()).count();
        let sources_ok = fetched.len() - sources_failed;
        if sources_ok == 0 && self.fail_when_all_unreachable {
            return Err(RunError::AllSourcesUnreachable(sources_failed));
        }

        info!(sources_ok, sources_failed, "parsing");
        let entries: Vec<JobEntry> = fetched
            .into_iter()
            .filter_map(|(source, result)| result.ok().map(|raw| (source, raw)))
            .flat_map(|(source, raw)| source::parse_or_skip(source, &raw))
            .collect();
        let entries_parsed = entries.len();

        info!(entries = entries_parsed, keywords = self.keywords.keywords().len(), "filtering");
        let matched = filter::filter(entries, &self.keywords);
        let entries_matched = matched.len();

        info!(matched = entries_matched, "deduplicating");
        let batch = dedupe(matched, registry);
        let entries_new = batch.len();

        let mut report = RunReport {
            sources_ok,
            sources_failed,
            entries_parsed,
            entries_matched,
            entries_new,
            outcome: Outcome::NothingNew,
            registry_error: None,
        };

        if batch.is_empty() {
            info!("no new matching jobs");
            return Ok(report);
        }

        info!(jobs = entries_new, channel = self.notifier.name(), "notifying");
        let notification = Notification::compose(&batch);
        if let Err(e) = self.notifier.send(&notification) {
            error!(error = %e, "notification failed; seen registry left unchanged");
            return Err(e.into());
        }

        if self.dry_run {
            report.outcome = Outcome::DryRun(entries_new);
            return Ok(report);
        }
        report.outcome = Outcome::Notified(entries_new);

        let links: Vec<String> = batch.into_iter().map(|m| m.entry.link).collect();
        if let Err(e) = registry.record(&links) {
            let detail = format!("{:#}", anyhow::Error::new(e));
            error!(error = %detail, "notification sent but seen registry was not saved");
            report.registry_error = Some(detail);
        }
        Ok(report)
    }
}

/// Drop matches already in the registry, and repeats of a link within the
/// batch (first occurrence wins).
pub fn dedupe(matches: Vec<Match>, registry: &dyn SeenRegistry) -> Vec<Match> {
    let mut in_batch: HashSet<String> = HashSet::new();
    matches
        .into_iter()
        .filter(|m| {
            let link = &m.entry.link;
            if registry.contains(link) {
                debug!(%link, "already notified");
                return false;
            }
            in_batch.insert(link.clone())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
