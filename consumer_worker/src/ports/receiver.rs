//! Grounded on
//! `original_source/consumer_worker/internal/ports/notification_receiver.go`'s
//! `NotificationReceiver` interface.

use async_trait::async_trait;
use delayed_notifier_core::Notification;
use tokio::sync::mpsc;

use crate::error::ConsumerError;

#[async_trait]
pub trait NotificationReceiver: Send + Sync {
  /// Begins consuming in the background and returns the receiving half of
  /// the decoded notification stream. Called exactly once.
  async fn start_receiving(&self) -> Result<mpsc::Receiver<Notification>, ConsumerError>;

  /// Stops consuming and closes the underlying bus channel. Called exactly
  /// once, after `start_receiving`.
  async fn stop_receiving(&self) -> Result<(), ConsumerError>;
}
