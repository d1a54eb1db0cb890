//! Telegram Bot API delivery.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use super::{Notification, Notifier};
use crate::config::TelegramConfig;
use crate::error::NotifyError;

const API_BASE: &str = "https://api.telegram.org";
const TIMEOUT: Duration = Duration::from_secs(10);

/// Bot API limit on `sendMessage` text, in characters.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Telegram(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }
}

/// Subject plus the compact job list. Oversized batches fail here, before
/// any request, so the next channel gets the batch.
fn message_text(notification: &Notification) -> Result<String, NotifyError> {
    let text = format!("{}\n\n{}", notification.subject, notification.compact);
    let chars = text.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(NotifyError::Telegram(format!(
            "message is {chars} characters, over the {MAX_MESSAGE_CHARS} limit"
        )));
    }
    Ok(text)
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("{API_BASE}/bot{}/sendMessage", self.bot_token);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message_text(notification)?,
            disable_web_page_preview: true,
        };

        // Errors are formatted without the URL, which embeds the bot token.
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .map_err(|e| NotifyError::Telegram(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(NotifyError::Telegram(format!("HTTP {status}: {detail}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::filter::Match;
    use crate::source::JobEntry;

    fn batch(count: usize, title_len: usize, summary_len: usize) -> Vec<Match> {
        (0..count)
            .map(|i| Match {
                entry: JobEntry::new(
                    "T".repeat(title_len),
                    Some(&format!("https://example.com/jobs/{i}")),
                    "s".repeat(summary_len),
                    None,
                )
                .unwrap(),
                keywords: vec!["python".into()],
            })
            .collect()
    }

    #[test]
    fn text_leads_with_subject_and_uses_compact_list() {
        let notification = Notification {
            subject: "1 New Job(s) Matching Your Keywords".into(),
            text: "Python Dev\nlong summary\n".into(),
            html: String::new(),
            compact: "Python Dev - https://x/1\nMatches: python\n".into(),
        };
        assert_eq!(
            message_text(&notification).unwrap(),
            "1 New Job(s) Matching Your Keywords\n\nPython Dev - https://x/1\nMatches: python\n"
        );
    }

    #[test]
    fn summaries_do_not_count_against_the_limit() {
        let notification = Notification::compose(&batch(15, 40, 560));
        assert!(notification.text.chars().count() > MAX_MESSAGE_CHARS);

        let text = message_text(&notification).unwrap();
        assert!(text.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(text.contains("https://example.com/jobs/14"));
    }

    #[test]
    fn oversized_batch_fails_before_sending() {
        let notification = Notification::compose(&batch(60, 100, 0));
        assert!(matches!(
            message_text(&notification),
            Err(NotifyError::Telegram(ref msg)) if msg.contains("4096")
        ));
    }

    #[test]
    fn request_body_serialises() {
        let body = SendMessage {
            chat_id: "42",
            text: "hi".into(),
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["disable_web_page_preview"], true);
    }
}
