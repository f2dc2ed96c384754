//! # delayed_notifier_core
//!
//! Shared domain types for the delayed notification pipeline: the
//! `Notification` model, the wire DTOs exchanged over the message bus, the
//! dead-letter queue primitive, a generic retry strategy, and the address
//! validators shared by the producer and the consumer.

pub mod dlq;
pub mod dto;
pub mod model;
pub mod retry;
pub mod validation;

pub use dlq::{Dlq, DlqItem, DlqSender};
pub use model::{Channel, Content, Notification};
pub use retry::{retry, RetryPolicy};
