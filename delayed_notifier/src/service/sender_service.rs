//! Background fetch-and-publish loop.
//!
//! Grounded on
//! `original_source/delayed_notifier/internal/service/sender_service.go`
//! line for line: the `fetchPeriod` ticker, `SendBatch`'s per-DLQ-item
//! retry fan-out (`errgroup` becomes `FuturesUnordered`), `WhenNextFetch`,
//! and `QuickSendIfNeeded`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::AppError;
use crate::ports::{NotificationFetcherRepository, NotificationPublisherRepository};
use delayed_notifier_core::Notification;

/// Shares `WhenNextFetch` across tasks without a lock: stored as a unix
/// millisecond timestamp, written only by the ticker loop and read by
/// `quick_send_if_needed` from any handler task.
pub struct SenderService<F, P> {
  fetch_period: time::Duration,
  fetch_max_diapason: ChronoDuration,
  fetcher: Arc<F>,
  publisher: Arc<P>,
  next_fetch_is_at_millis: AtomicI64,
}

impl<F, P> SenderService<F, P>
where
  F: NotificationFetcherRepository + 'static,
  P: NotificationPublisherRepository + 'static,
{
  pub fn new(
    fetch_period: time::Duration,
    fetch_max_diapason: time::Duration,
    fetcher: Arc<F>,
    publisher: Arc<P>,
  ) -> Self {
    Self {
      fetch_period,
      fetch_max_diapason: ChronoDuration::from_std(fetch_max_diapason)
        .unwrap_or_else(|_| ChronoDuration::zero()),
      fetcher,
      publisher,
      next_fetch_is_at_millis: AtomicI64::new(Utc::now().timestamp_millis()),
    }
  }

  /// The main blocking loop. Returns once `cancellation` is triggered.
  pub async fn run(self: Arc<Self>, cancellation: CancellationToken) {
    let mut ticker = time::interval(self.fetch_period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = cancellation.cancelled() => {
          info!("sender service stopping");
          break;
        }
        _ = ticker.tick() => {
          let now = Utc::now();
          self
            .next_fetch_is_at_millis
            .store((now + self.fetch_period_as_chrono()).timestamp_millis(), Ordering::SeqCst);

          let horizon = now + self.fetch_max_diapason;
          let batch = match self.fetcher.fetch(horizon).await {
            Ok(batch) => batch,
            Err(err) => {
              error!(error = %err, "failed to fetch batch for sending");
              continue;
            }
          };

          if batch.is_empty() {
            continue;
          }

          if let Err(err) = self.send_batch(batch).await {
            error!(error = %err, "failed to send batch");
          }
        }
      }
    }
  }

  fn fetch_period_as_chrono(&self) -> ChronoDuration {
    ChronoDuration::from_std(self.fetch_period).unwrap_or_else(|_| ChronoDuration::zero())
  }

  /// Sends one notification immediately. Used both by `quick_send_if_needed`
  /// and as the per-item retry inside `send_batch`.
  pub async fn quick_send(&self, notification: &Notification) -> Result<(), AppError> {
    self.publisher.send_one(notification).await
  }

  /// Publishes `batch` as a stream (spec.md §4.2), then retries every item
  /// that lands in the DLQ, each with its own retry budget and concurrently
  /// with the others (the original's `errgroup.Group`).
  pub async fn send_batch(&self, batch: Vec<Notification>) -> Result<(), AppError> {
    let batch_len = batch.len();
    let mut dlq = self.publisher.send_many(batch);

    let mut retries = FuturesUnordered::new();
    let mut failed_count = 0usize;

    while let Some(item) = dlq.recv().await {
      failed_count += 1;
      let notification = item.into_value();
      retries.push(async move {
        let result = self.quick_send(&notification).await;
        (notification, result)
      });
    }

    let mut hard_failures = 0usize;
    while let Some((notification, result)) = retries.next().await {
      match result {
        Ok(()) => info!(id = %notification.id, "resent after initial failure"),
        Err(err) => {
          error!(id = %notification.id, error = %err, "failed to send notification even on retry");
          hard_failures += 1;
        }
      }
    }

    if hard_failures > 0 {
      return Err(AppError::Internal(anyhow::anyhow!(
        "failed to send {hard_failures}/{failed_count} objects from a batch of {batch_len}"
      )));
    }

    Ok(())
  }

  /// Tells when the next periodic fetch will run.
  pub fn when_next_fetch(&self) -> DateTime<Utc> {
    let millis = self.next_fetch_is_at_millis.load(Ordering::SeqCst);
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
  }

  /// Sends `notification` right away if it's due before the next scheduled
  /// fetch would pick it up. Called after create (spec.md §4.3's fast
  /// path).
  pub async fn quick_send_if_needed(&self, notification: &Notification) -> Result<(), AppError> {
    if notification.publication_at < self.when_next_fetch() {
      self.quick_send(notification).await
    } else {
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use delayed_notifier_core::{Channel, Content, Dlq};
  use std::sync::Mutex;
  use uuid::Uuid;

  struct StubFetcher;

  #[async_trait]
  impl NotificationFetcherRepository for StubFetcher {
    async fn fetch(&self, _max_publication_at: DateTime<Utc>) -> Result<Vec<Notification>, AppError> {
      Ok(Vec::new())
    }

    async fn mark_as_sent(&self, _ids: &[Uuid]) -> Result<(), AppError> {
      Ok(())
    }
  }

  struct RecordingPublisher {
    sent: Mutex<Vec<Uuid>>,
    fail_once_for: Mutex<Vec<Uuid>>,
  }

  #[async_trait]
  impl NotificationPublisherRepository for RecordingPublisher {
    async fn send_one(&self, notification: &Notification) -> Result<(), AppError> {
      let mut fail_once_for = self.fail_once_for.lock().unwrap();
      if let Some(pos) = fail_once_for.iter().position(|id| *id == notification.id) {
        fail_once_for.remove(pos);
        return Err(AppError::Internal(anyhow::anyhow!("still failing")));
      }
      self.sent.lock().unwrap().push(notification.id);
      Ok(())
    }

    fn send_many(&self, batch: Vec<Notification>) -> Dlq<Notification> {
      let (tx, dlq) = Dlq::channel(batch.len().max(1));
      let fail_for: Vec<Uuid> = self.fail_once_for.lock().unwrap().clone();
      tokio::spawn(async move {
        for notification in batch {
          if fail_for.contains(&notification.id) {
            tx.put(notification, anyhow::anyhow!("initial publish failed")).await;
          }
        }
        tx.close();
      });
      dlq
    }
  }

  fn sample_notification(publication_at: DateTime<Utc>) -> Notification {
    Notification {
      id: Uuid::new_v4(),
      publication_at,
      channel: Channel::Console,
      content: Content { title: "t".into(), message: "m".into() },
      send_to: String::new(),
      sent: false,
    }
  }

  #[tokio::test]
  async fn send_batch_retries_dlq_items_and_succeeds() {
    let retry_me = sample_notification(Utc::now());
    let publisher = Arc::new(RecordingPublisher {
      sent: Mutex::new(Vec::new()),
      fail_once_for: Mutex::new(vec![retry_me.id]),
    });
    let fetcher = Arc::new(StubFetcher);
    let service = SenderService::new(
      time::Duration::from_secs(1),
      time::Duration::from_secs(1),
      fetcher,
      publisher.clone(),
    );

    service.send_batch(vec![retry_me.clone()]).await.unwrap();
    assert_eq!(publisher.sent.lock().unwrap().as_slice(), &[retry_me.id]);
  }

  #[tokio::test]
  async fn quick_send_if_needed_skips_when_not_due_before_next_fetch() {
    let publisher = Arc::new(RecordingPublisher {
      sent: Mutex::new(Vec::new()),
      fail_once_for: Mutex::new(Vec::new()),
    });
    let fetcher = Arc::new(StubFetcher);
    let service = SenderService::new(
      time::Duration::from_secs(3600),
      time::Duration::from_secs(0),
      fetcher,
      publisher.clone(),
    );

    let far_future = sample_notification(Utc::now() + ChronoDuration::days(1));
    service.quick_send_if_needed(&far_future).await.unwrap();
    assert!(publisher.sent.lock().unwrap().is_empty());

    let due_now = sample_notification(Utc::now());
    service.quick_send_if_needed(&due_now).await.unwrap();
    assert_eq!(publisher.sent.lock().unwrap().as_slice(), &[due_now.id]);
  }
}
