//! Generic exponential-backoff retry, used by every adapter that crosses a
//! network boundary (bus, SQL, cache, SMTP — spec.md §6 "retry
//! {attempts, delay_ms, backoff} per {bus, sql, cache, email}").
//!
//! Grounded on `fechatter_core/src/services/retry.rs`'s
//! `ExponentialBackoffRetry`, generalized from a fixed `PublishError` to any
//! error type so the same policy drives all four adapter kinds.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// One named retry policy (e.g. the `bus` or `email` entry under the
/// configuration's `retry` map, spec.md §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
  pub attempts: u32,
  pub delay_ms: u64,
  pub backoff: f64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { attempts: 3, delay_ms: 200, backoff: 2.0 }
  }
}

impl RetryPolicy {
  fn delay_for(&self, attempt: u32) -> Duration {
    let ms = self.delay_ms as f64 * self.backoff.powi(attempt as i32);
    Duration::from_millis(ms as u64)
  }
}

/// Runs `operation` up to `policy.attempts` times with exponential backoff
/// between tries, returning the last error if every attempt fails.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: std::fmt::Display,
{
  let mut attempt = 0;
  loop {
    match operation().await {
      Ok(value) => return Ok(value),
      Err(err) => {
        if attempt + 1 >= policy.attempts {
          return Err(err);
        }
        let delay = policy.delay_for(attempt);
        warn!(attempt, %err, ?delay, "operation failed, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[tokio::test]
  async fn succeeds_after_transient_failures() {
    let policy = RetryPolicy { attempts: 5, delay_ms: 1, backoff: 1.0 };
    let calls = AtomicU32::new(0);

    let result: Result<&str, anyhow::Error> = retry(&policy, || async {
      let n = calls.fetch_add(1, Ordering::SeqCst);
      if n < 2 {
        Err(anyhow::anyhow!("not yet"))
      } else {
        Ok("done")
      }
    })
    .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn exhausts_attempts_and_returns_last_error() {
    let policy = RetryPolicy { attempts: 2, delay_ms: 1, backoff: 1.0 };
    let calls = AtomicU32::new(0);

    let result: Result<(), anyhow::Error> = retry(&policy, || async {
      calls.fetch_add(1, Ordering::SeqCst);
      Err(anyhow::anyhow!("always fails"))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
