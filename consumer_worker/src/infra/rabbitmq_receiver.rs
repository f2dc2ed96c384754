//! The `NotificationReceiver` RabbitMQ implementation.
//!
//! Grounded on
//! `original_source/consumer_worker/internal/repositories/receivers/rabbitmq.go`:
//! a background task drains bus deliveries into a channel that
//! `processMessage`/`NotificationModelFromSendDTO` decodes, and
//! `StopReceiving` closes the channel to unwind the consume loop. The
//! two-goroutine handoff collapses here into one `tokio::spawn`ed task
//! since `lapin::Consumer` is itself a `Stream` — no separate raw-bytes
//! channel is needed before decoding.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
  BasicAckOptions, BasicConsumeOptions, BasicNackOptions, ExchangeDeclareOptions,
  QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use delayed_notifier_core::{dto::NotificationSendBody, retry::retry, Notification, RetryPolicy};

use crate::config::BusConfig;
use crate::error::ConsumerError;
use crate::ports::receiver::NotificationReceiver;

/// The three recognized channel routing keys (spec.md §4.9): the consumer
/// binds its one queue to each of them so it receives every channel this
/// worker is responsible for dispatching.
const ROUTING_KEYS: [&str; 3] = ["email", "telegram", "console"];

pub struct RabbitMqReceiver {
  channel: Channel,
  queue: String,
  consumer_tag: String,
  auto_ack: bool,
  no_wait: bool,
  retry_policy: RetryPolicy,
}

impl RabbitMqReceiver {
  pub async fn connect(config: &BusConfig) -> Result<Self, ConsumerError> {
    let connection = Connection::connect(&config.amqp_uri(), ConnectionProperties::default())
      .await
      .map_err(ConsumerError::Bus)?;
    let channel = connection.create_channel().await.map_err(ConsumerError::Bus)?;

    channel
      .exchange_declare(
        &config.exchange,
        ExchangeKind::Direct,
        ExchangeDeclareOptions { durable: true, ..Default::default() },
        FieldTable::default(),
      )
      .await
      .map_err(ConsumerError::Bus)?;

    channel
      .queue_declare(
        &config.queue,
        QueueDeclareOptions { durable: true, ..Default::default() },
        FieldTable::default(),
      )
      .await
      .map_err(ConsumerError::Bus)?;

    for routing_key in ROUTING_KEYS {
      channel
        .queue_bind(
          &config.queue,
          &config.exchange,
          routing_key,
          QueueBindOptions::default(),
          FieldTable::default(),
        )
        .await
        .map_err(ConsumerError::Bus)?;
    }

    Ok(Self {
      channel,
      queue: config.queue.clone(),
      consumer_tag: config.consumer_tag.clone(),
      auto_ack: config.auto_ack,
      no_wait: config.no_wait,
      retry_policy: config.retry,
    })
  }
}

#[async_trait]
impl NotificationReceiver for RabbitMqReceiver {
  async fn start_receiving(&self) -> Result<mpsc::Receiver<Notification>, ConsumerError> {
    let channel = self.channel.clone();
    let queue = self.queue.clone();
    let consumer_tag = self.consumer_tag.clone();
    let options = BasicConsumeOptions { no_ack: self.auto_ack, no_wait: self.no_wait, ..Default::default() };

    let mut consumer = retry(&self.retry_policy, || {
      let channel = channel.clone();
      let queue = queue.clone();
      let consumer_tag = consumer_tag.clone();
      async move {
        channel.basic_consume(&queue, &consumer_tag, options, FieldTable::default()).await
      }
    })
    .await
    .map_err(ConsumerError::Bus)?;

    let auto_ack = self.auto_ack;
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
      while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
          Ok(delivery) => delivery,
          Err(err) => {
            warn!(%err, "error receiving delivery from rabbitmq");
            continue;
          }
        };

        match serde_json::from_slice::<NotificationSendBody>(&delivery.data) {
          Ok(body) => {
            let notification = Notification::from(body);
            debug!(id = %notification.id, channel = %notification.channel, "notification received from rabbitmq");
            if !auto_ack {
              let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            if tx.send(notification).await.is_err() {
              break;
            }
          }
          Err(err) => {
            warn!(%err, "bad message (bad json), dropping");
            if !auto_ack {
              let _ = delivery.nack(BasicNackOptions::default()).await;
            }
          }
        }
      }
    });

    Ok(rx)
  }

  async fn stop_receiving(&self) -> Result<(), ConsumerError> {
    self.channel.close(200, "stopping receiver").await.map_err(ConsumerError::Bus)
  }
}
