//! Re-exports the shared domain model and adds the sqlx row mapping, the
//! way `fechatter_server/src/domains/notification/entities.rs` keeps the
//! entity and its storage mapping in one module.

pub use delayed_notifier_core::model::{Channel, Content, Notification};

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// Maps a `notifications` table row (spec.md §6) onto the domain entity.
/// `channel` is stored as text and parsed back into the closed enum; a row
/// with an unrecognized channel value can't exist because the ingress
/// handler rejects it before it's ever inserted (spec.md §3).
impl FromRow<'_, PgRow> for Notification {
  fn from_row(row: &PgRow) -> sqlx::Result<Self> {
    let channel_text: String = row.try_get("channel")?;
    let channel = match channel_text.as_str() {
      "email" => Channel::Email,
      "telegram" => Channel::Telegram,
      "console" => Channel::Console,
      other => {
        return Err(sqlx::Error::Decode(
          format!("unrecognized channel '{other}' in storage").into(),
        ))
      }
    };

    Ok(Notification {
      id: row.try_get::<Uuid, _>("id")?,
      publication_at: row.try_get::<DateTime<Utc>, _>("publication_at")?,
      channel,
      content: Content {
        title: row.try_get("title")?,
        message: row.try_get("message")?,
      },
      send_to: row.try_get("send_to")?,
      sent: row.try_get("sent")?,
    })
  }
}
