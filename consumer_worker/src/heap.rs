//! The consumer's scheduling structure: a min-heap on `publication_at`.
//!
//! Grounded on
//! `original_source/consumer_worker/internal/notificationheap/notification_heap.go`'s
//! `push`/`pop`/`peek`/`len` contract, rebuilt on `std::collections::BinaryHeap`
//! (a max-heap) wrapped in `Reverse` rather than the original's hand-rolled
//! `heap.Interface` slice, and compared directly on `DateTime<Utc>` instead
//! of the original's string-reparsed `time.Parse(time.RFC3339, ...)` (spec.md
//! REDESIGN FLAGS).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;

use delayed_notifier_core::Notification;

/// Guarded by a single mutex owned by the caller's service loop — held only
/// around `push`/`pop`/`peek`, never across a dispatch (spec.md §4.6, §5).
pub struct NotificationHeap {
  inner: Mutex<BinaryHeap<Reverse<Notification>>>,
}

impl NotificationHeap {
  pub fn new() -> Self {
    Self { inner: Mutex::new(BinaryHeap::new()) }
  }

  pub fn push(&self, notification: Notification) {
    self.inner.lock().unwrap().push(Reverse(notification));
  }

  pub fn pop(&self) -> Option<Notification> {
    self.inner.lock().unwrap().pop().map(|Reverse(n)| n)
  }

  /// Returns the publication time of the earliest-due item without
  /// removing it, or `None` if the heap is empty.
  pub fn peek_publication_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
    self.inner.lock().unwrap().peek().map(|Reverse(n)| n.publication_at)
  }

  pub fn len(&self) -> usize {
    self.inner.lock().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for NotificationHeap {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use delayed_notifier_core::{Channel, Content};
  use chrono::{Duration, Utc};
  use uuid::Uuid;

  fn mk(at: chrono::DateTime<chrono::Utc>) -> Notification {
    Notification {
      id: Uuid::new_v4(),
      publication_at: at,
      channel: Channel::Console,
      content: Content { title: "t".into(), message: "m".into() },
      send_to: String::new(),
      sent: false,
    }
  }

  #[test]
  fn peek_and_pop_return_the_earliest_publication_at() {
    let heap = NotificationHeap::new();
    let now = Utc::now();
    heap.push(mk(now + Duration::seconds(5)));
    heap.push(mk(now));
    heap.push(mk(now + Duration::seconds(1)));

    assert_eq!(heap.peek_publication_at(), Some(now));
    let popped = heap.pop().unwrap();
    assert_eq!(popped.publication_at, now);
    assert_eq!(heap.len(), 2);
  }

  #[test]
  fn empty_heap_peeks_and_pops_none() {
    let heap = NotificationHeap::new();
    assert!(heap.is_empty());
    assert_eq!(heap.peek_publication_at(), None);
    assert_eq!(heap.pop(), None);
  }
}
