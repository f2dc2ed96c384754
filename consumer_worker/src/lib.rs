//! # consumer_worker
//!
//! The consumer half of the delayed notification pipeline: drains the bus
//! into an in-memory min-heap and dispatches due notifications to
//! per-channel senders. No HTTP surface — spec.md's external interfaces
//! list only the producer's CRUD API.

pub mod config;
pub mod error;
pub mod heap;
pub mod infra;
pub mod ports;
pub mod senders;
pub mod service;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use config::AppConfig;
pub use error::ConsumerError;

use delayed_notifier_core::Channel;
use infra::RabbitMqReceiver;
use ports::sender::NotificationSender;
use senders::{ConsoleSender, EmailSender, TelegramSender};
use service::NotificationService;

pub type AppNotificationService = NotificationService<RabbitMqReceiver>;

/// Connects to the bus, wires up the fixed channel-to-sender map, and
/// returns a `NotificationService` ready to `run`. The sender map is built
/// once here and never mutated afterward (spec.md §5 "Sender map:
/// read-only after construction; no lock").
pub async fn build_service(config: &AppConfig) -> anyhow::Result<Arc<AppNotificationService>> {
  let receiver = Arc::new(RabbitMqReceiver::connect(&config.bus).await?);

  let mut channel_to_sender: HashMap<Channel, Arc<dyn NotificationSender>> = HashMap::new();
  channel_to_sender.insert(Channel::Console, Arc::new(ConsoleSender));
  channel_to_sender.insert(
    Channel::Email,
    Arc::new(EmailSender::new(
      config.senders.email.from.clone(),
      config.senders.email.password.clone(),
      config.senders.email.host.clone(),
      config.senders.email.port,
      config.senders.email.retry,
    )?),
  );
  channel_to_sender.insert(
    Channel::Telegram,
    Arc::new(TelegramSender::new(config.senders.telegram.bot_token.clone())),
  );

  Ok(Arc::new(NotificationService::new(
    receiver,
    channel_to_sender,
    Duration::from_millis(config.check_period_ms),
  )))
}
