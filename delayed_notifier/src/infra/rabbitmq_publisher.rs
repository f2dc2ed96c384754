//! The `NotificationPublisherRepository` RabbitMQ implementation.
//!
//! Grounded on `original_source/delayed_notifier/internal/repositories/notification_rabbitmq.go`
//! for the `send_one`/`send_many` shape, and on
//! `other_examples/464120f9_szabgab-amqp-lapin-helper__src-lib.rs.rs` for the
//! lapin `Channel::basic_publish` idiom.

use async_trait::async_trait;
use delayed_notifier_core::{dto::NotificationSendBody, retry, Dlq, Notification, RetryPolicy};
use lapin::{options::BasicPublishOptions, BasicProperties, Channel};
use tracing::debug;

use crate::error::AppError;
use crate::ports::publisher::NotificationPublisherRepository;

pub struct RabbitMqPublisher {
  channel: Channel,
  exchange: String,
  retry_policy: RetryPolicy,
}

impl RabbitMqPublisher {
  pub fn new(channel: Channel, exchange: String, retry_policy: RetryPolicy) -> Self {
    Self { channel, exchange, retry_policy }
  }

  fn routing_key(notification: &Notification) -> String {
    notification.channel.routing_key().to_string()
  }

  async fn publish_once(&self, notification: &Notification) -> Result<(), anyhow::Error> {
    let body = NotificationSendBody::from(notification);
    let payload = serde_json::to_vec(&body)?;
    let routing_key = Self::routing_key(notification);

    self
      .channel
      .basic_publish(
        &self.exchange,
        &routing_key,
        BasicPublishOptions::default(),
        &payload,
        BasicProperties::default().with_content_type("application/json".into()),
      )
      .await?
      .await?;
    Ok(())
  }
}

#[async_trait]
impl NotificationPublisherRepository for RabbitMqPublisher {
  async fn send_one(&self, notification: &Notification) -> Result<(), AppError> {
    retry(&self.retry_policy, || self.publish_once(notification))
      .await
      .map_err(AppError::Internal)?;
    debug!(id = %notification.id, "sent one message to the bus");
    Ok(())
  }

  fn send_many(&self, batch: Vec<Notification>) -> Dlq<Notification> {
    let buffer_size = (batch.len() / 10).max(1);
    let (dlq_sender, dlq) = Dlq::channel(buffer_size);

    // This background task owns the channel handle by cloning it (lapin's
    // `Channel` is cheaply cloneable, backed by an internal `Arc`), so the
    // caller can move on immediately while publishing continues.
    let channel = self.channel.clone();
    let exchange = self.exchange.clone();
    let retry_policy = self.retry_policy;

    tokio::spawn(async move {
      let publisher = RabbitMqPublisher { channel, exchange, retry_policy };
      for notification in batch {
        let result = retry(&retry_policy, || publisher.publish_once(&notification)).await;
        match result {
          Ok(()) => debug!(id = %notification.id, "sent message in batch to the bus"),
          Err(err) => dlq_sender.put(notification, err).await,
        }
      }
      dlq_sender.close();
    });

    dlq
  }
}
