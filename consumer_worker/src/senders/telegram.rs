//! A placeholder sender: spec.md §4.7 describes `TelegramSender` as a
//! placeholder in the original source too — no bot API call exists to
//! ground this on, so it logs and succeeds, matching the shape of
//! `ConsoleSender` rather than inventing a Telegram Bot API client.

use async_trait::async_trait;
use tracing::info;

use delayed_notifier_core::Notification;

use crate::error::ConsumerError;
use crate::ports::sender::NotificationSender;

pub struct TelegramSender {
  bot_token: Option<String>,
}

impl TelegramSender {
  pub fn new(bot_token: Option<String>) -> Self {
    Self { bot_token }
  }
}

#[async_trait]
impl NotificationSender for TelegramSender {
  async fn send(&self, notification: &Notification) -> Result<(), ConsumerError> {
    info!(
      id = %notification.id,
      chat_id = %notification.send_to,
      configured = self.bot_token.is_some(),
      "telegram notification (placeholder, not actually delivered)"
    );
    Ok(())
  }
}
