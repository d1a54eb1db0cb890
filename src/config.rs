//! Run configuration.
//!
//! Loaded once from a TOML file at process start, patched with secrets from
//! the environment, validated, and then handed to every component by
//! reference. Nothing reads configuration from anywhere else.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::filter::KeywordSet;
use crate::source::{FeedKind, FeedSource};

/// RemoteOK's public job API.
pub const REMOTEOK_URL: &str = "https://remoteok.com/api";

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Sender mailbox, also used as the SMTP login.
    #[serde(default)]
    pub smtp_user: String,
    /// SMTP credential (app password for Gmail).
    #[serde(default)]
    pub smtp_pass: String,
    /// Recipient mailbox.
    #[serde(default)]
    pub email_to: String,
    /// `From:` address. Defaults to `smtp_user`.
    #[serde(default)]
    pub email_from: Option<String>,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_timeout_secs")]
    pub smtp_timeout_secs: u64,

    /// Keywords matched case-insensitively as substrings.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Number of distinct keywords an entry must contain.
    #[serde(default = "default_min_keyword_match")]
    pub min_keyword_match: usize,

    /// RSS/Atom feed URLs, polled in this order.
    #[serde(default)]
    pub feed_sources: Vec<String>,
    /// Also poll the RemoteOK JSON API (after the feeds).
    #[serde(default)]
    pub remoteok: bool,

    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub seen: SeenConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_min_keyword_match() -> usize {
    1
}

/// HTTP fetching behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Treat a run where every source failed to fetch as a failed run.
    #[serde(default)]
    pub fail_when_all_unreachable: bool,
}

fn default_user_agent() -> String {
    "JobWatcherBot/1.0 (+https://example.com)".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            fail_when_all_unreachable: false,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Seen-link tracking. Without a path every run is stateless.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeenConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Optional Telegram delivery, tried before email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Override secrets from the environment.
    ///
    /// Supported variables: `JOB_WATCH_SMTP_USER`, `JOB_WATCH_SMTP_PASS`,
    /// `JOB_WATCH_EMAIL_TO`, `JOB_WATCH_TELEGRAM_BOT_TOKEN`,
    /// `JOB_WATCH_TELEGRAM_CHAT_ID`. Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 5] = [
            ("JOB_WATCH_SMTP_USER", &mut self.smtp_user),
            ("JOB_WATCH_SMTP_PASS", &mut self.smtp_pass),
            ("JOB_WATCH_EMAIL_TO", &mut self.email_to),
            ("JOB_WATCH_TELEGRAM_BOT_TOKEN", &mut self.telegram.bot_token),
            ("JOB_WATCH_TELEGRAM_CHAT_ID", &mut self.telegram.chat_id),
        ];
        for (key, field) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
    }

    /// Check the configuration is usable for a run.
    ///
    /// `dry_run` skips the delivery-channel requirement, since nothing is
    /// sent.
    pub fn validate(&self, dry_run: bool) -> Result<(), ConfigError> {
        if self.feed_sources.is_empty() && !self.remoteok {
            return Err(ConfigError::Invalid(
                "no feed_sources configured and remoteok is disabled".into(),
            ));
        }
        // Surfaces empty keyword lists and min_keyword_match bounds.
        self.keyword_set()?;
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be > 0".into()));
        }
        if self.smtp_timeout_secs == 0 {
            return Err(ConfigError::Invalid("smtp_timeout_secs must be > 0".into()));
        }
        if !dry_run && !self.smtp_configured() && !self.telegram.is_configured() {
            return Err(ConfigError::Invalid(
                "set smtp_user, smtp_pass and email_to, or telegram.bot_token and telegram.chat_id"
                    .into(),
            ));
        }
        Ok(())
    }

    pub fn smtp_configured(&self) -> bool {
        !self.smtp_user.is_empty() && !self.smtp_pass.is_empty() && !self.email_to.is_empty()
    }

    pub fn email_from(&self) -> &str {
        self.email_from.as_deref().unwrap_or(&self.smtp_user)
    }

    pub fn keyword_set(&self) -> Result<KeywordSet, ConfigError> {
        KeywordSet::new(&self.keywords, self.min_keyword_match)
    }

    /// Sources in polling order: configured feeds, then RemoteOK.
    pub fn sources(&self) -> Vec<FeedSource> {
        let mut sources: Vec<FeedSource> = self
            .feed_sources
            .iter()
            .map(|url| FeedSource::new(url.trim(), FeedKind::Syndication))
            .collect();
        if self.remoteok {
            sources.push(FeedSource::new(REMOTEOK_URL, FeedKind::RemoteOk));
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
smtp_user = "me@example.com"
smtp_pass = "app-password"
email_to = "me@example.com"
keywords = ["python", "django"]
feed_sources = ["https://example.com/jobs.rss"]
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.min_keyword_match, 1);
        assert_eq!(config.fetch.timeout_secs, 15);
        assert!(!config.fetch.fail_when_all_unreachable);
        assert!(config.seen.path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.email_from(), "me@example.com");
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn parse_sections() {
        let toml = format!(
            "{MINIMAL}\nremoteok = true\n[fetch]\ntimeout_secs = 5\nfail_when_all_unreachable = true\n\
             [seen]\npath = \"state/seen.json\"\n[telegram]\nbot_token = \"t\"\nchat_id = \"c\"\n"
        );
        let config = Config::parse(&toml).unwrap();
        assert_eq!(config.fetch.timeout(), Duration::from_secs(5));
        assert!(config.fetch.fail_when_all_unreachable);
        assert_eq!(config.seen.path, Some(PathBuf::from("state/seen.json")));
        assert!(config.telegram.is_configured());

        let sources = config.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, FeedKind::Syndication);
        assert_eq!(sources[1].url, REMOTEOK_URL);
        assert_eq!(sources[1].kind, FeedKind::RemoteOk);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::parse("keywords = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load("/nonexistent/job-watch.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn rejects_missing_sources() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.feed_sources.clear();
        assert!(matches!(config.validate(false), Err(ConfigError::Invalid(_))));
        config.remoteok = true;
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn rejects_out_of_range_min_match() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.min_keyword_match = 3;
        assert!(config.validate(false).is_err());
        config.min_keyword_match = 0;
        assert!(config.validate(false).is_err());
        config.min_keyword_match = 2;
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let toml = format!("smtp_timeout_secs = 0\n{MINIMAL}");
        let config = Config::parse(&toml).unwrap();
        assert!(matches!(
            config.validate(false),
            Err(ConfigError::Invalid(ref msg)) if msg.contains("smtp_timeout_secs")
        ));

        let mut config = Config::parse(MINIMAL).unwrap();
        config.fetch.timeout_secs = 0;
        assert!(matches!(
            config.validate(false),
            Err(ConfigError::Invalid(ref msg)) if msg.contains("fetch.timeout_secs")
        ));
    }

    #[test]
    fn rejects_missing_channels_unless_dry_run() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.smtp_pass.clear();
        assert!(config.validate(false).is_err());
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn env_overrides_replace_non_empty_values_only() {
        let mut config = Config::parse(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            ("JOB_WATCH_SMTP_PASS", "from-env"),
            ("JOB_WATCH_EMAIL_TO", ""),
            ("JOB_WATCH_TELEGRAM_CHAT_ID", "42"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.smtp_pass, "from-env");
        assert_eq!(config.email_to, "me@example.com");
        assert_eq!(config.telegram.chat_id, "42");
        assert_eq!(config.smtp_user, "me@example.com");
    }
}
