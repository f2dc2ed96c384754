//! Grounded on
//! `original_source/consumer_worker/internal/repositories/senders/console.go`.

use async_trait::async_trait;
use delayed_notifier_core::Notification;
use tracing::info;

use crate::error::ConsumerError;
use crate::ports::sender::NotificationSender;

pub struct ConsoleSender;

#[async_trait]
impl NotificationSender for ConsoleSender {
  async fn send(&self, notification: &Notification) -> Result<(), ConsumerError> {
    info!(
      id = %notification.id,
      channel = %notification.channel,
      title = %notification.content.title,
      message = %notification.content.message,
      publication_at = %notification.publication_at,
      "console notification"
    );
    Ok(())
  }
}
