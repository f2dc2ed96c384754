//! Grounded on
//! `original_source/delayed_notifier/internal/repositories/notification_redis.go`'s
//! `NotificationCRUDCacheRepository` (save/get/delete), supplemented into
//! SPEC_FULL.md's read-through cache since the distilled spec.md only
//! mentions caching in passing.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use delayed_notifier_core::Notification;

#[async_trait]
pub trait NotificationCacheRepository: Send + Sync {
  /// Writes the notification under `notification:<id>` with the configured
  /// TTL. Used for both create and update.
  async fn save(&self, notification: &Notification) -> Result<(), AppError>;

  /// Returns `Ok(None)` on a cache miss; never represents a miss as an
  /// error (unlike the original's `GetNotification`, which treats "not
  /// found" as an application error best left to the caller's fallback
  /// to Postgres).
  async fn get(&self, id: Uuid) -> Result<Option<Notification>, AppError>;

  async fn delete(&self, id: Uuid) -> Result<(), AppError>;

  /// Checks connectivity, for `GET /health`. Does not touch the retry
  /// policy — a single failed `PING` should surface immediately.
  async fn ping(&self) -> Result<(), AppError>;
}
