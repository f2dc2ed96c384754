//! Grounded on `original_source/consumer_worker/internal/repositories/senders/email.go`:
//! `from`/`password`/`host:port` address, `smtp.PlainAuth`, and the
//! `"<title>\n\n<message>"` body format, retried with the same strategy
//! shape. Translated from `net/smtp` to `lettre`'s async SMTP transport the
//! way `fechatter_server/src/services/infrastructure/notification/channels.rs`
//! builds its `AsyncSmtpTransport` (PLAIN credentials, explicit port).

use async_trait::async_trait;
use lettre::message::Message;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use delayed_notifier_core::{retry::retry, Notification, RetryPolicy};

use crate::error::ConsumerError;
use crate::ports::sender::NotificationSender;

pub struct EmailSender {
  from: String,
  transport: AsyncSmtpTransport<Tokio1Executor>,
  retry_policy: RetryPolicy,
}

impl EmailSender {
  pub fn new(
    from: String,
    password: String,
    host: String,
    port: u16,
    retry_policy: RetryPolicy,
  ) -> Result<Self, ConsumerError> {
    let credentials = Credentials::new(from.clone(), password);
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
      .map_err(|err| ConsumerError::Send(anyhow::anyhow!(err)))?
      .port(port)
      .credentials(credentials)
      .build();

    Ok(Self { from, transport, retry_policy })
  }

  async fn send_once(&self, notification: &Notification) -> Result<(), anyhow::Error> {
    let body = format!("{}\n\n{}", notification.content.title, notification.content.message);

    let message = Message::builder()
      .from(self.from.parse()?)
      .to(notification.send_to.parse()?)
      .subject(&notification.content.title)
      .body(body)?;

    self.transport.send(message).await?;
    Ok(())
  }
}

#[async_trait]
impl NotificationSender for EmailSender {
  async fn send(&self, notification: &Notification) -> Result<(), ConsumerError> {
    retry(&self.retry_policy, || self.send_once(notification))
      .await
      .map_err(ConsumerError::Send)
  }
}
