//! Grounded on `fechatter_server/src/error.rs`: a `thiserror` enum mapped to
//! HTTP status codes via `IntoResponse`, with a uniform `{code, error}` JSON
//! body.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Json, Response},
};
use delayed_notifier_core::validation::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOutput {
  pub code: u16,
  pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("cache error: {0}")]
  Cache(#[from] redis::RedisError),

  #[error("bus error: {0}")]
  Bus(#[from] lapin::Error),

  #[error("internal error: {0}")]
  Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
  fn from(e: ValidationError) -> Self {
    AppError::InvalidInput(e.to_string())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match &self {
      AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Sqlx(_) | AppError::Cache(_) | AppError::Bus(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let code = status.as_u16();
    let body = Json(ErrorOutput { code, error: self.to_string() });
    (status, body).into_response()
  }
}
