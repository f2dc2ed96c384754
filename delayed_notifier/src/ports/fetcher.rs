//! Grounded on `original_source/delayed_notifier/internal/ports/notification_sender.go`'s
//! `NotificationFetcherRepository` interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use delayed_notifier_core::Notification;

#[async_trait]
pub trait NotificationFetcherRepository: Send + Sync {
  /// Returns unsent notifications with `publication_at <= max_publication_at`,
  /// claimed so a later call in the same window won't return them again.
  async fn fetch(&self, max_publication_at: DateTime<Utc>) -> Result<Vec<Notification>, AppError>;

  /// Idempotent; marks the given ids `sent = true`.
  async fn mark_as_sent(&self, ids: &[Uuid]) -> Result<(), AppError>;
}
