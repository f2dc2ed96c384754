//! The `NotificationCacheRepository` Redis implementation.
//!
//! Grounded on `fechatter_server/src/services/infrastructure/cache/redis.rs`
//! for the `MultiplexedConnection` + `RwLock` + JSON-blob shape, and on
//! `original_source/delayed_notifier/internal/repositories/notification_redis.go`
//! for the `notification:<uuid>` key convention and save/get/delete
//! operations.

use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::ports::cache::NotificationCacheRepository;
use async_trait::async_trait;
use delayed_notifier_core::{retry::retry, Notification, RetryPolicy};

pub struct RedisNotificationCache {
  conn: Arc<RwLock<MultiplexedConnection>>,
  ttl_secs: u64,
  retry_policy: RetryPolicy,
}

impl RedisNotificationCache {
  pub async fn connect(
    address: &str,
    password: Option<&str>,
    db: i64,
    ttl_secs: u64,
    retry_policy: RetryPolicy,
  ) -> Result<Self, AppError> {
    let url = match password {
      Some(password) => format!("redis://:{password}@{address}/{db}"),
      None => format!("redis://{address}/{db}"),
    };
    let client = redis::Client::open(url).map_err(AppError::Cache)?;
    let conn = client.get_multiplexed_async_connection().await.map_err(AppError::Cache)?;
    Ok(Self { conn: Arc::new(RwLock::new(conn)), ttl_secs, retry_policy })
  }

  fn key(id: Uuid) -> String {
    format!("notification:{id}")
  }
}

#[async_trait]
impl NotificationCacheRepository for RedisNotificationCache {
  async fn save(&self, notification: &Notification) -> Result<(), AppError> {
    let data = serde_json::to_vec(notification).map_err(|e| AppError::Internal(e.into()))?;
    retry(&self.retry_policy, || async {
      let mut conn = self.conn.write().await;
      let _: () = conn.set_ex(Self::key(notification.id), data.clone(), self.ttl_secs).await?;
      Ok(())
    })
    .await
    .map_err(AppError::Cache)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Notification>, AppError> {
    let data: Option<Vec<u8>> = retry(&self.retry_policy, || async {
      let mut conn = self.conn.write().await;
      conn.get(Self::key(id)).await
    })
    .await
    .map_err(AppError::Cache)?;

    match data {
      Some(bytes) => {
        let notification = serde_json::from_slice(&bytes).map_err(|e| AppError::Internal(e.into()))?;
        Ok(Some(notification))
      }
      None => Ok(None),
    }
  }

  async fn delete(&self, id: Uuid) -> Result<(), AppError> {
    retry(&self.retry_policy, || async {
      let mut conn = self.conn.write().await;
      let _: () = conn.del(Self::key(id)).await?;
      Ok(())
    })
    .await
    .map_err(AppError::Cache)
  }

  async fn ping(&self) -> Result<(), AppError> {
    let mut conn = self.conn.write().await;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await.map_err(AppError::Cache)?;
    Ok(())
  }
}
