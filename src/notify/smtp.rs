//! Email delivery over SMTP with STARTTLS.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{Notification, Notifier};
use crate::config::Config;
use crate::error::NotifyError;

pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport from config. Addresses are checked here so a typo
    /// fails the run before any feed is fetched.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let from = parse_mailbox(config.email_from())?;
        let to = parse_mailbox(&config.email_to)?;

        let transport = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| NotifyError::Email(format!("SMTP relay {}: {e}", config.smtp_host)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.smtp_timeout_secs)))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        build_message(self.from.clone(), self.to.clone(), notification)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e| NotifyError::Email(format!("invalid address {address:?}: {e}")))
}

fn build_message(
    from: Mailbox,
    to: Mailbox,
    notification: &Notification,
) -> Result<Message, NotifyError> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(notification.subject.as_str())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(notification.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(notification.html.clone()),
                ),
        )
        .map_err(|e| NotifyError::Email(format!("cannot build message: {e}")))
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = self.build_message(notification)?;
        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(|e| NotifyError::Email(e.to_string()))
    }
}
