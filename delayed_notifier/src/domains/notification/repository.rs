//! Storage port for the CRUD handlers *and* the sender service's fetch
//! window — one Postgres-backed struct implements both, since they share
//! the same table and pool.
//!
//! Grounded on `fechatter_server/src/domains/notification/repository.rs`
//! (async-trait repository over `Arc<PgPool>`) for the CRUD half, and
//! `original_source/delayed_notifier/internal/ports/notification_sender.go`
//! (`Fetch`/`MarkAsSent`) for the fetch-window half.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::entities::Notification;
use crate::error::AppError;
use crate::ports::fetcher::NotificationFetcherRepository;
use delayed_notifier_core::{retry::retry, RetryPolicy};

/// The cap on how many rows a single `fetch` call returns, so a very wide
/// window can't load an unbounded batch into memory (spec.md §4.3: "bounded
/// in count by an implementation-defined cap").
const FETCH_BATCH_CAP: i64 = 500;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
  async fn create(&self, notification: &Notification) -> Result<(), AppError>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, AppError>;
  async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

pub struct PostgresNotificationRepository {
  pool: Arc<PgPool>,
  retry_policy: RetryPolicy,
}

impl PostgresNotificationRepository {
  pub fn new(pool: Arc<PgPool>, retry_policy: RetryPolicy) -> Self {
    Self { pool, retry_policy }
  }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
  async fn create(&self, notification: &Notification) -> Result<(), AppError> {
    retry(&self.retry_policy, || async {
      sqlx::query(
        "INSERT INTO notifications (id, publication_at, channel, title, message, send_to, sent)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
      )
      .bind(notification.id)
      .bind(notification.publication_at)
      .bind(notification.channel.routing_key())
      .bind(&notification.content.title)
      .bind(&notification.content.message)
      .bind(&notification.send_to)
      .bind(notification.sent)
      .execute(self.pool.as_ref())
      .await
    })
    .await?;
    Ok(())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, AppError> {
    let row = retry(&self.retry_policy, || async {
      sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await
    })
    .await?;
    Ok(row)
  }

  async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
    let result = retry(&self.retry_policy, || async {
      sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(self.pool.as_ref())
        .await
    })
    .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl NotificationFetcherRepository for PostgresNotificationRepository {
  /// Fetch-and-claim in one statement: `UPDATE ... RETURNING` atomically
  /// marks the selected rows `sent = true` so a concurrent fetch within the
  /// same window can't return them too (spec.md §4.3, §8 property 5).
  async fn fetch(&self, max_publication_at: DateTime<Utc>) -> Result<Vec<Notification>, AppError> {
    let rows = retry(&self.retry_policy, || async {
      sqlx::query_as::<_, Notification>(
        "UPDATE notifications
         SET sent = true
         WHERE id IN (
           SELECT id FROM notifications
           WHERE sent = false AND publication_at <= $1
           ORDER BY publication_at ASC
           LIMIT $2
           FOR UPDATE SKIP LOCKED
         )
         RETURNING *",
      )
      .bind(max_publication_at)
      .bind(FETCH_BATCH_CAP)
      .fetch_all(self.pool.as_ref())
      .await
    })
    .await?;
    Ok(rows)
  }

  /// Idempotent: re-marking an already-sent row is a no-op (spec.md §4.3).
  async fn mark_as_sent(&self, ids: &[Uuid]) -> Result<(), AppError> {
    if ids.is_empty() {
      return Ok(());
    }
    retry(&self.retry_policy, || async {
      sqlx::query("UPDATE notifications SET sent = true WHERE id = ANY($1)")
        .bind(ids)
        .execute(self.pool.as_ref())
        .await
    })
    .await?;
    Ok(())
  }
}
