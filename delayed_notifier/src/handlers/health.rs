//! `GET /health`, grounded on `fechatter_server/src/handlers/health.rs`'s
//! per-dependency checker pattern, covering the three dependencies this
//! service has: Postgres, Redis, and the bus channel (SPEC_FULL.md §6).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
  pub name: &'static str,
  pub healthy: bool,
  pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemHealth {
  pub healthy: bool,
  pub components: Vec<ComponentHealth>,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
  let db = match sqlx::query("SELECT 1").fetch_one(state.pool.as_ref()).await {
    Ok(_) => ComponentHealth { name: "postgres", healthy: true, error: None },
    Err(err) => ComponentHealth { name: "postgres", healthy: false, error: Some(err.to_string()) },
  };

  let cache = match state.cache.ping().await {
    Ok(()) => ComponentHealth { name: "redis", healthy: true, error: None },
    Err(err) => ComponentHealth { name: "redis", healthy: false, error: Some(err.to_string()) },
  };

  let bus = if state.bus.status().connected() {
    ComponentHealth { name: "rabbitmq", healthy: true, error: None }
  } else {
    ComponentHealth {
      name: "rabbitmq",
      healthy: false,
      error: Some("channel is not connected".to_string()),
    }
  };

  let components = vec![db, cache, bus];
  let healthy = components.iter().all(|c| c.healthy);
  let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

  (status, Json(SystemHealth { healthy, components }))
}
