//! Grounded on
//! `original_source/consumer_worker/internal/ports/notification_receiver.go`'s
//! `NotificationSender` interface.

use async_trait::async_trait;
use delayed_notifier_core::Notification;

use crate::error::ConsumerError;

#[async_trait]
pub trait NotificationSender: Send + Sync {
  /// Delivers one notification over this sender's channel. Idempotency is
  /// not required and the caller never retries a terminal failure
  /// (spec.md §4.7).
  async fn send(&self, notification: &Notification) -> Result<(), ConsumerError>;
}
