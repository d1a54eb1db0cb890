//! Dry-run delivery: print the message instead of sending it.

use std::io::Write;

use super::{Notification, Notifier};
use crate::error::NotifyError;

pub struct StdoutNotifier;

fn write_to(out: &mut impl Write, notification: &Notification) -> Result<(), NotifyError> {
    writeln!(out, "Subject: {}\n\n{}", notification.subject, notification.text)
        .map_err(NotifyError::Stdout)
}

impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        write_to(&mut std::io::stdout().lock(), notification)
    }
}
