//! Error taxonomy for a single run.
//!
//! Per-item errors ([`FetchError`], [`ParseError`]) are recovered where they
//! happen and only logged. [`ConfigError`], [`RegistryError`] at load time and
//! [`NotifyError`] surface through [`RunError`] and decide the exit code.

use thiserror::Error;

/// Retrieving one feed failed. Never fatal on its own.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid feed URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Raw content could not be turned into entries. Never fatal on its own.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("not a recognised feed format (rss: {rss}; fallback: {fallback})")]
    UnrecognizedFormat { rss: String, fallback: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of postings")]
    NotAnArray,
}

/// A delivery channel refused or failed to send the batch.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("email: {0}")]
    Email(String),

    #[error("telegram: {0}")]
    Telegram(String),

    #[error("stdout: {0}")]
    Stdout(std::io::Error),

    #[error("no notification channel is configured")]
    NotConfigured,

    #[error("every notification channel failed: {}", join_errors(.0))]
    AllChannelsFailed(Vec<NotifyError>),
}

fn join_errors(errors: &[NotifyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reading or writing the persisted set of notified links failed.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("seen registry I/O on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seen registry {path} is corrupt")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The configuration is missing or unusable. Raised before any network I/O.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that end a run unsuccessfully.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("all {0} feed sources were unreachable")]
    AllSourcesUnreachable(usize),

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl RunError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) => 2,
            _ => 1,
        }
    }
}
