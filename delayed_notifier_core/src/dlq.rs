//! A generic dead-letter queue: a single-producer, single-consumer stream of
//! `(value, error)` pairs.
//!
//! Grounded on `original_source/delayed_notifier/pkg/dlq/dlq.go`: `new`,
//! `put`, `items`, `close`. The Go version is one shared struct whose
//! channel is written by a producer goroutine and ranged over by the
//! caller; here the two roles are split into a `DlqSender<T>` (moved into
//! the producing task) and a `Dlq<T>` (kept by the caller to drain), which
//! is the natural shape of a `tokio::sync::mpsc` channel and makes "exactly
//! one producer" a type-level guarantee rather than a documented one.

use tokio::sync::mpsc;

/// One failed item: the original value plus why it failed.
pub struct DlqItem<T> {
  value: T,
  error: anyhow::Error,
}

impl<T> DlqItem<T> {
  pub fn value(&self) -> &T {
    &self.value
  }

  pub fn into_value(self) -> T {
    self.value
  }

  pub fn error(&self) -> &anyhow::Error {
    &self.error
  }
}

/// The consumer half: ranges over failed items until the sole
/// [`DlqSender`] is dropped or explicitly [`close`](DlqSender::close)d.
pub struct Dlq<T> {
  receiver: mpsc::Receiver<DlqItem<T>>,
}

impl<T> Dlq<T> {
  /// Creates a DLQ channel pair. `buffer_size = 0` is coerced to `1` since
  /// `tokio::sync::mpsc` has no true rendezvous mode; either way, `put`
  /// still awaits until the item is in the channel's buffer.
  pub fn channel(buffer_size: usize) -> (DlqSender<T>, Dlq<T>) {
    let (sender, receiver) = mpsc::channel(buffer_size.max(1));
    (DlqSender { sender }, Dlq { receiver })
  }

  /// Receives the next failed item, or `None` once the DLQ is closed and
  /// drained.
  pub async fn recv(&mut self) -> Option<DlqItem<T>> {
    self.receiver.recv().await
  }
}

/// The producer half. Cloneable so a batch of concurrent publish tasks can
/// share one DLQ, but the intended usage is still "exactly one logical
/// producer" (spec.md §4.1) — e.g. one `sendMany` background task.
#[derive(Clone)]
pub struct DlqSender<T> {
  sender: mpsc::Sender<DlqItem<T>>,
}

impl<T> DlqSender<T> {
  /// Appends a failed item; awaits until there is buffer space.
  pub async fn put(&self, value: T, error: anyhow::Error) {
    let _ = self.sender.send(DlqItem { value, error }).await;
  }

  /// Explicit, idempotent-by-construction close: consuming `self` drops the
  /// one sender handle the caller holds, which is all that's needed to end
  /// the paired [`Dlq::recv`] stream once every clone is gone.
  pub fn close(self) {}
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn liveness_items_are_received_in_put_order_then_terminates() {
    let (tx, mut dlq) = Dlq::<i32>::channel(16);

    let producer = tokio::spawn(async move {
      for n in 0..5 {
        tx.put(n, anyhow::anyhow!("bad {n}")).await;
      }
      tx.close();
    });
    producer.await.unwrap();

    let mut seen = Vec::new();
    while let Some(item) = dlq.recv().await {
      seen.push(*item.value());
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
  }

  #[tokio::test]
  async fn close_with_no_items_terminates_immediately() {
    let (tx, mut dlq) = Dlq::<i32>::channel(1);
    tx.close();
    assert!(dlq.recv().await.is_none());
  }
}
