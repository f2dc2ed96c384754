//! Grounded on `original_source/delayed_notifier/internal/ports/notification_sender.go`'s
//! `NotificationPublisherRepository` interface and
//! `original_source/delayed_notifier/internal/repositories/notification_rabbitmq.go`'s
//! `SendOne`/`SendMany`.

use async_trait::async_trait;
use delayed_notifier_core::{Dlq, Notification};

use crate::error::AppError;

#[async_trait]
pub trait NotificationPublisherRepository: Send + Sync {
  /// Publishes one notification, retrying internally. Routing key is the
  /// notification's channel (spec.md §4.9).
  async fn send_one(&self, notification: &Notification) -> Result<(), AppError>;

  /// Starts a background task that publishes each notification in `batch`
  /// in order, routing per-item failures into the returned DLQ and closing
  /// it when the batch is exhausted. Returns immediately (spec.md §4.2).
  fn send_many(&self, batch: Vec<Notification>) -> Dlq<Notification>;
}
