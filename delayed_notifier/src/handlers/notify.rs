//! `POST /notify`, `GET /notify/:id`, `DELETE /notify/:id`.
//!
//! Grounded on `fechatter_server/src/handlers/chat.rs`'s CRUD handler shape
//! (`State<AppState>` + `Json`/`Path` extractors, `AppError` propagated via
//! `?`) and on `original_source/delayed_notifier/internal/transport/http/handlers.go`
//! for the create-then-publish-fast-path sequencing (spec.md §3, §4.3). The
//! original fires the fast path with a detached `go func(...)`
//! (`internal/service/crud_service.go:56-63`) rather than blocking the
//! response on it, which this mirrors with `tokio::spawn`.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;
use uuid::Uuid;

use delayed_notifier_core::dto::{CreateNotificationBody, FullNotificationBody};
use delayed_notifier_core::validation::validate_send_to;
use delayed_notifier_core::Notification;

use crate::domains::notification::NotificationRepository;
use crate::error::AppError;
use crate::ports::NotificationCacheRepository;
use crate::AppState;

/// Bounds how long the detached fast-path publish task may run before it's
/// abandoned — it must not retry forever on a slow bus (spec.md §9's
/// context-propagation note).
const FAST_PATH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_notification(
  State(state): State<AppState>,
  Json(body): Json<CreateNotificationBody>,
) -> Result<impl IntoResponse, AppError> {
  validate_send_to(body.channel, &body.send_to)?;

  let notification = Notification {
    id: Uuid::new_v4(),
    publication_at: body.publication_at,
    channel: body.channel,
    content: body.content,
    send_to: body.send_to,
    sent: false,
  };

  state
    .repository
    .create(&notification)
    .await
    .map_err(|err| AppError::Conflict(err.to_string()))?;

  if let Err(err) = state.cache.save(&notification).await {
    warn!(id = %notification.id, error = %err, "failed to warm cache after create");
  }

  spawn_fast_path_publish(&state, notification.clone());

  Ok((StatusCode::CREATED, Json(FullNotificationBody::from(notification))))
}

/// Fires the fast-path publish without blocking the HTTP response, racing
/// it against both a bounded timeout and the service's shutdown signal so
/// it can never outlive the process or run unbounded.
fn spawn_fast_path_publish(state: &AppState, notification: Notification) {
  let sender_service = state.sender_service.clone();
  let shutdown = state.shutdown.clone();

  tokio::spawn(async move {
    tokio::select! {
      _ = shutdown.cancelled() => {}
      result = tokio::time::timeout(FAST_PATH_TIMEOUT, sender_service.quick_send_if_needed(&notification)) => {
        match result {
          Ok(Ok(())) => {}
          Ok(Err(err)) => {
            warn!(id = %notification.id, error = %err, "fast-path publish failed, regular fetch will retry it");
          }
          Err(_) => {
            warn!(id = %notification.id, "fast-path publish timed out, regular fetch will retry it");
          }
        }
      }
    }
  });
}

pub async fn get_notification(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
  if let Some(cached) = state.cache.get(id).await? {
    return Ok(Json(FullNotificationBody::from(cached)));
  }

  let notification = state
    .repository
    .find_by_id(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("notification '{id}' not found")))?;

  if let Err(err) = state.cache.save(&notification).await {
    warn!(id = %id, error = %err, "failed to populate cache on read-through");
  }

  Ok(Json(FullNotificationBody::from(notification)))
}

pub async fn delete_notification(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
  let deleted = state.repository.delete(id).await?;
  if !deleted {
    return Err(AppError::NotFound(format!("notification '{id}' not found")));
  }

  if let Err(err) = state.cache.delete(id).await {
    warn!(id = %id, error = %err, "failed to invalidate cache after delete");
  }

  Ok(StatusCode::NO_CONTENT)
}
