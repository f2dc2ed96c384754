//! HTTP and bus wire DTOs (spec.md §6). Kept separate from the domain model
//! (`model.rs`) so storage/bus representation changes don't leak into
//! `Notification` itself — the same separation `original_source`'s `dto`
//! packages draw from `models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Channel, Content, Notification};

/// `POST /notify` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationBody {
  pub publication_at: DateTime<Utc>,
  pub channel: Channel,
  pub content: Content,
  #[serde(default)]
  pub send_to: String,
}

/// `POST /notify` (201) and `GET /notify/:id` (200) response body.
#[derive(Debug, Clone, Serialize)]
pub struct FullNotificationBody {
  pub id: Uuid,
  pub publication_at: DateTime<Utc>,
  pub channel: Channel,
  pub content: Content,
  pub send_to: String,
  pub sent: bool,
}

impl From<Notification> for FullNotificationBody {
  fn from(n: Notification) -> Self {
    Self {
      id: n.id,
      publication_at: n.publication_at,
      channel: n.channel,
      content: n.content,
      send_to: n.send_to,
      sent: n.sent,
    }
  }
}

/// The bus wire format (spec.md §6): `send_to` is omitted when empty, which
/// is why it is `Option<String>` here but a plain `String` on the domain
/// model (an empty console `send_to` is valid but not worth shipping over
/// the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSendBody {
  pub id: Uuid,
  pub publication_at: DateTime<Utc>,
  pub channel: Channel,
  pub content: Content,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub send_to: Option<String>,
}

impl From<&Notification> for NotificationSendBody {
  fn from(n: &Notification) -> Self {
    Self {
      id: n.id,
      publication_at: n.publication_at,
      channel: n.channel,
      content: n.content.clone(),
      send_to: if n.send_to.is_empty() { None } else { Some(n.send_to.clone()) },
    }
  }
}

impl From<NotificationSendBody> for Notification {
  fn from(body: NotificationSendBody) -> Self {
    Self {
      id: body.id,
      publication_at: body.publication_at,
      channel: body.channel,
      content: body.content,
      send_to: body.send_to.unwrap_or_default(),
      sent: true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn send_body_omits_empty_send_to() {
    let n = Notification {
      id: Uuid::new_v4(),
      publication_at: Utc::now(),
      channel: Channel::Console,
      content: Content { title: "t".into(), message: "m".into() },
      send_to: String::new(),
      sent: false,
    };
    let body = NotificationSendBody::from(&n);
    let json = serde_json::to_string(&body).unwrap();
    assert!(!json.contains("send_to"));
  }

  #[test]
  fn send_body_keeps_nonempty_send_to() {
    let n = Notification {
      id: Uuid::new_v4(),
      publication_at: Utc::now(),
      channel: Channel::Email,
      content: Content { title: "t".into(), message: "m".into() },
      send_to: "a@b.com".into(),
      sent: false,
    };
    let body = NotificationSendBody::from(&n);
    let json = serde_json::to_string(&body).unwrap();
    assert!(json.contains("a@b.com"));
  }
}
