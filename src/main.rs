//! job-watch — polls job feeds and emails new keyword matches.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐ raw bytes ┌──────────┐ entries ┌──────────┐ matches ┌──────────┐ batch ┌──────────┐
//! │ source    │ ────────► │ source   │ ──────► │ filter   │ ──────► │ seen     │ ────► │ notify   │
//! │ (fetch)   │           │ (parse)  │         │          │         │ (dedupe) │       │          │
//! └───────────┘           └──────────┘         └──────────┘         └──────────┘       └──────────┘
//! ```
//!
//! * **`source/`** — the `HttpFetch` capability, feed formats (RSS, Atom,
//!   RemoteOK JSON) and the `JobEntry` record.
//! * **`filter`** — keyword set and substring matching.
//! * **`seen`** — the registry of already-notified links.
//! * **`notify/`** — message composition and delivery channels.
//! * **`pipeline`** — runs the stages above once, in order.
//! * **`main`** — parses args, loads config, wires the pieces together and
//!   maps the result to an exit code.
//!
//! There is no loop: schedule the binary with cron or a systemd timer, e.g.
//! `*/15 * * * * job-watch --config /etc/job-watch.toml`.

mod config;
mod error;
mod filter;
mod logging;
mod notify;
mod pipeline;
mod seen;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use config::Config;
use error::{ConfigError, RunError};
use notify::{Fallback, Notifier, SmtpNotifier, StdoutNotifier, TelegramNotifier};
use pipeline::{Pipeline, RunReport};
use seen::{FileRegistry, NullRegistry, SeenRegistry};
use source::HttpFetcher;

#[derive(Parser, Debug)]
#[command(name = "job-watch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "job-watch.toml")]
    config: PathBuf,

    /// Print the notification instead of sending it; the seen registry is
    /// not updated.
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error). Overrides the config.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config is needed for the log level, so logging starts right after the
    // load attempt whether or not it succeeded.
    let loaded = Config::load(&cli.config).and_then(|c| {
        c.validate(cli.dry_run)?;
        Ok(c)
    });
    let level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    logging::init(&level);

    let result = loaded
        .map_err(RunError::from)
        .context("configuration")
        .and_then(|config| run(&cli, &config));

    match result {
        Ok(report) => {
            info!(outcome = ?report.outcome, "done: {report}");
            if let Some(e) = &report.registry_error {
                warn!("seen registry not updated, jobs may be repeated next run: {e}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            let code = e.downcast_ref::<RunError>().map_or(1, RunError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<RunReport> {
    let notifier = build_notifier(config, cli.dry_run).context("configuration")?;
    let mut registry = open_registry(config).context("loading seen registry")?;

    let http = HttpFetcher::new(config.fetch.timeout(), &config.fetch.user_agent)
        .map_err(RunError::HttpClient)?;

    let pipeline = Pipeline::new(config, &http, notifier.as_ref())?.dry_run(cli.dry_run);
    Ok(pipeline.run(registry.as_mut())?)
}

/// Telegram first when configured, then email.
fn build_notifier(config: &Config, dry_run: bool) -> Result<Box<dyn Notifier>, RunError> {
    if dry_run {
        return Ok(Box::new(StdoutNotifier));
    }

    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
    if config.telegram.is_configured() {
        channels.push(Box::new(TelegramNotifier::new(&config.telegram)?));
    }
    if config.smtp_configured() {
        let smtp = SmtpNotifier::from_config(config)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        channels.push(Box::new(smtp));
    }
    Ok(Box::new(Fallback::new(channels)))
}

fn open_registry(config: &Config) -> Result<Box<dyn SeenRegistry>, RunError> {
    match &config.seen.path {
        Some(path) => {
            let registry = FileRegistry::open(path)?;
            info!(
                path = %registry.path().display(),
                links = registry.len(),
                "tracking seen jobs"
            );
            Ok(Box::new(registry))
        }
        None => {
            info!("no seen registry configured; every match is treated as new");
            Ok(Box::new(NullRegistry))
        }
    }
}
