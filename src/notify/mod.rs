//! Composing and delivering the notification for one run.
//!
//! A run produces at most one [`Notification`]: every new match goes into the
//! same message, so a batch is either delivered whole or not at all.
//! Delivery channels implement [`Notifier`]; [`Fallback`] tries them in order
//! and stops at the first success.

mod smtp;
mod stdout;
mod telegram;

pub use smtp::SmtpNotifier;
pub use stdout::StdoutNotifier;
pub use telegram::TelegramNotifier;

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::filter::Match;

/// Longest summary excerpt included per job, in characters.
const SNIPPET_CHARS: usize = 280;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// The composed message for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub text: String,
    pub html: String,
    /// One `title - link` line plus matches per job, without summaries, for
    /// channels with tight length limits.
    pub compact: String,
}

impl Notification {
    /// Build the message listing every match, in order.
    pub fn compose(batch: &[Match]) -> Self {
        let subject = format!("{} New Job(s) Matching Your Keywords", batch.len());

        let mut text = String::new();
        let mut html = String::new();
        let mut compact = String::new();
        for (i, m) in batch.iter().enumerate() {
            let entry = &m.entry;
            let matches = m.keywords.join(", ");
            let excerpt = snippet(&entry.summary);
            let posted = entry
                .published_at
                .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string());

            if i > 0 {
                text.push('\n');
                html.push_str("<br><br>\n");
                compact.push('\n');
            }

            let _ = writeln!(compact, "{} - {}\nMatches: {matches}", entry.title, entry.link);

            let _ = writeln!(text, "{}", entry.title);
            let _ = writeln!(text, "Matches: {matches}");
            let _ = writeln!(text, "{}", entry.link);
            if let Some(posted) = &posted {
                let _ = writeln!(text, "Posted: {posted}");
            }
            if !excerpt.is_empty() {
                let _ = writeln!(text, "{excerpt}");
            }

            let _ = write!(
                html,
                "<b>{}</b><br>\nMatches: {}<br>\n<a href=\"{}\">{}</a>",
                html_escape::encode_text(&entry.title),
                html_escape::encode_text(&matches),
                html_escape::encode_double_quoted_attribute(&entry.link),
                html_escape::encode_text(&entry.link),
            );
            if let Some(posted) = &posted {
                let _ = write!(html, "<br>\nPosted: {posted}");
            }
            if !excerpt.is_empty() {
                let _ = write!(html, "<br>\n{}", html_escape::encode_text(&excerpt));
            }
        }

        Self {
            subject,
            text,
            html,
            compact,
        }
    }
}

/// Plain-text excerpt of a (possibly HTML) summary.
fn snippet(summary: &str) -> String {
    let stripped = TAG.replace_all(summary, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    let collapsed = SPACE.replace_all(decoded.trim(), " ");

    if collapsed.chars().count() <= SNIPPET_CHARS {
        return collapsed.into_owned();
    }
    let mut cut: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

/// A channel that can deliver a notification.
pub trait Notifier {
    fn name(&self) -> &str;

    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Tries each channel in order until one succeeds.
pub struct Fallback {
    channels: Vec<Box<dyn Notifier>>,
}

impl Fallback {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }
}

impl Notifier for Fallback {
    fn name(&self) -> &str {
        "fallback"
    }

    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.channels.is_empty() {
            return Err(NotifyError::NotConfigured);
        }

        let mut failures = Vec::new();
        for channel in &self.channels {
            match channel.send(notification) {
                Ok(()) => {
                    info!(channel = channel.name(), "notification sent");
                    return Ok(());
                }
                Err(e) => {
                    warn!(channel = channel.name(), error = %e, "notification channel failed");
                    failures.push(e);
                }
            }
        }
        Err(NotifyError::AllChannelsFailed(failures))
    }
}
