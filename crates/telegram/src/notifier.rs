use std::time::Duration;

use async_trait::async_trait;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{ParseMode, Recipient},
};
use tracing::{debug, warn};

use common::{Error, MessageFormat, Notifier, Result};

/// Delivers alerts through the Telegram Bot API.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    /// Build a notifier whose HTTP calls give up after `timeout`.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build Telegram client: {e}")))?;
        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }

    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str, format: MessageFormat) -> Result<()> {
        let recipient = parse_recipient(destination)?;
        let request = self.bot.send_message(recipient, text);
        let request = match parse_mode(format) {
            Some(mode) => request.parse_mode(mode),
            None => request,
        };

        match request.await {
            Ok(message) => {
                debug!(message_id = message.id.0, "Telegram message sent");
                Ok(())
            }
            Err(e) => {
                warn!(destination, error = %e, "Failed to send Telegram message");
                Err(Error::Notification(e.to_string()))
            }
        }
    }
}

/// Numeric ids address users, groups and channels; `@name` addresses a
/// public channel.
pub fn parse_recipient(destination: &str) -> Result<Recipient> {
    let destination = destination.trim();
    if let Ok(id) = destination.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if destination.len() > 1 && destination.starts_with('@') {
        return Ok(Recipient::ChannelUsername(destination.to_string()));
    }
    Err(Error::Notification(format!(
        "invalid Telegram destination '{destination}'"
    )))
}

fn parse_mode(format: MessageFormat) -> Option<ParseMode> {
    match format {
        MessageFormat::Plain => None,
        MessageFormat::Html => Some(ParseMode::Html),
    }
}
