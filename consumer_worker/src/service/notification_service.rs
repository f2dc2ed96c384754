//! The consumer's dispatch core (spec.md §4.8).
//!
//! Grounded on
//! `original_source/consumer_worker/internal/service/notification_service.go`'s
//! `Run` method, which completes the `// TODO: min-heap & timer` the
//! original left unimplemented: goroutine A drains the receiver into the
//! heap, goroutine B ticks the heap and dispatches due items with the lock
//! released across the send.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration as ChronoDuration;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use delayed_notifier_core::{Channel, Notification};

use crate::error::ConsumerError;
use crate::heap::NotificationHeap;
use crate::ports::receiver::NotificationReceiver;
use crate::ports::sender::NotificationSender;

pub struct NotificationService<R: NotificationReceiver> {
  receiver: Arc<R>,
  channel_to_sender: HashMap<Channel, Arc<dyn NotificationSender>>,
  heap: Arc<NotificationHeap>,
  check_period: StdDuration,
}

impl<R: NotificationReceiver + 'static> NotificationService<R> {
  pub fn new(
    receiver: Arc<R>,
    channel_to_sender: HashMap<Channel, Arc<dyn NotificationSender>>,
    check_period: StdDuration,
  ) -> Self {
    Self { receiver, channel_to_sender, heap: Arc::new(NotificationHeap::new()), check_period }
  }

  /// Runs until `cancellation` fires. Starts the receiver, spawns
  /// `serve_heap` (goroutine B) on the same cancellation, then drains the
  /// receiver's stream into the heap (goroutine A) until either the stream
  /// ends or cancellation fires, at which point it stops the receiver.
  pub async fn run(self: Arc<Self>, cancellation: CancellationToken) -> Result<(), ConsumerError> {
    let mut notifications = self.receiver.start_receiving().await?;

    let heap_task = {
      let service = self.clone();
      let cancellation = cancellation.clone();
      tokio::spawn(async move { service.serve_heap(cancellation).await })
    };

    loop {
      tokio::select! {
        _ = cancellation.cancelled() => break,
        received = notifications.recv() => {
          match received {
            Some(notification) => self.ingest(notification),
            None => break,
          }
        }
      }
    }

    let _ = heap_task.await;
    self.receiver.stop_receiving().await
  }

  fn ingest(&self, notification: Notification) {
    if !self.channel_to_sender.contains_key(&notification.channel) {
      warn!(id = %notification.id, channel = %notification.channel, "no sender registered for channel, dropping");
      return;
    }
    self.heap.push(notification);
  }

  async fn serve_heap(&self, cancellation: CancellationToken) {
    let mut ticker = tokio::time::interval(self.check_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = cancellation.cancelled() => break,
        _ = ticker.tick() => self.drain_due_items().await,
      }
    }
  }

  /// Pops and dispatches every item whose `publication_at` falls within
  /// `now + check_period`, releasing the heap's lock across each send.
  async fn drain_due_items(&self) {
    let slack = ChronoDuration::from_std(self.check_period).unwrap_or(ChronoDuration::zero());

    loop {
      let due = match self.heap.peek_publication_at() {
        Some(publication_at) => publication_at + slack <= Utc::now(),
        None => false,
      };
      if !due {
        break;
      }

      let Some(notification) = self.heap.pop() else { break };
      self.dispatch(notification).await;
    }
  }

  async fn dispatch(&self, notification: Notification) {
    let Some(sender) = self.channel_to_sender.get(&notification.channel) else {
      warn!(id = %notification.id, channel = %notification.channel, "no sender registered for channel, dropping");
      return;
    };

    match sender.send(&notification).await {
      Ok(()) => debug!(id = %notification.id, channel = %notification.channel, "notification dispatched"),
      Err(err) => info!(id = %notification.id, channel = %notification.channel, %err, "notification send failed, dropping (best-effort)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use chrono::Duration;
  use delayed_notifier_core::Content;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex as StdMutex;
  use tokio::sync::mpsc;
  use uuid::Uuid;

  struct StubReceiver {
    notifications: StdMutex<Option<Vec<Notification>>>,
    stopped: Arc<AtomicUsize>,
  }

  #[async_trait]
  impl NotificationReceiver for StubReceiver {
    async fn start_receiving(&self) -> Result<mpsc::Receiver<Notification>, ConsumerError> {
      let (tx, rx) = mpsc::channel(16);
      let notifications = self.notifications.lock().unwrap().take().unwrap_or_default();
      tokio::spawn(async move {
        for n in notifications {
          let _ = tx.send(n).await;
        }
      });
      Ok(rx)
    }

    async fn stop_receiving(&self) -> Result<(), ConsumerError> {
      self.stopped.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  struct RecordingSender {
    seen: Arc<StdMutex<Vec<Uuid>>>,
  }

  #[async_trait]
  impl NotificationSender for RecordingSender {
    async fn send(&self, notification: &Notification) -> Result<(), ConsumerError> {
      self.seen.lock().unwrap().push(notification.id);
      Ok(())
    }
  }

  fn mk(id: Uuid, at: chrono::DateTime<Utc>, channel: Channel) -> Notification {
    Notification {
      id,
      publication_at: at,
      channel,
      content: Content { title: "t".into(), message: "m".into() },
      send_to: String::new(),
      sent: false,
    }
  }

  #[tokio::test]
  async fn dispatches_due_items_in_ascending_publication_order() {
    let now = Utc::now() - Duration::seconds(10);
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let receiver = Arc::new(StubReceiver {
      notifications: StdMutex::new(Some(vec![
        mk(second, now + Duration::seconds(5), Channel::Console),
        mk(first, now, Channel::Console),
      ])),
      stopped: Arc::new(AtomicUsize::new(0)),
    });

    let seen = Arc::new(StdMutex::new(Vec::new()));
    let mut senders: HashMap<Channel, Arc<dyn NotificationSender>> = HashMap::new();
    senders.insert(Channel::Console, Arc::new(RecordingSender { seen: seen.clone() }));

    let service = Arc::new(NotificationService::new(receiver, senders, StdDuration::from_millis(10)));
    let cancellation = CancellationToken::new();

    let cancel_clone = cancellation.clone();
    tokio::spawn(async move {
      tokio::time::sleep(StdDuration::from_millis(100)).await;
      cancel_clone.cancel();
    });

    service.run(cancellation).await.unwrap();

    let order = seen.lock().unwrap().clone();
    assert_eq!(order, vec![first, second]);
  }

  #[tokio::test]
  async fn drops_notifications_with_unregistered_channel() {
    let receiver = Arc::new(StubReceiver {
      notifications: StdMutex::new(Some(vec![mk(
        Uuid::new_v4(),
        Utc::now() - Duration::seconds(1),
        Channel::Email,
      )])),
      stopped: Arc::new(AtomicUsize::new(0)),
    });

    let senders: HashMap<Channel, Arc<dyn NotificationSender>> = HashMap::new();
    let service = Arc::new(NotificationService::new(receiver, senders, StdDuration::from_millis(10)));
    let cancellation = CancellationToken::new();

    let cancel_clone = cancellation.clone();
    tokio::spawn(async move {
      tokio::time::sleep(StdDuration::from_millis(50)).await;
      cancel_clone.cancel();
    });

    service.run(cancellation).await.unwrap();
    assert_eq!(service.heap.len(), 0);
  }
}
