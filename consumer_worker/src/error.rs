//! Grounded on `delayed_notifier/src/error.rs`'s `thiserror` shape, trimmed
//! to this service's own failure modes — it has no HTTP surface, so there's
//! no `IntoResponse` impl.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsumerError {
  #[error("bus error: {0}")]
  Bus(#[from] lapin::Error),

  #[error("malformed delivery: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("send error: {0}")]
  Send(#[from] anyhow::Error),
}
