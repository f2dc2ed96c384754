use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery channel. Unknown values are rejected by serde at the ingress
/// boundary, which is what spec.md §3 means by "unrecognized channels never
/// enter storage" — they never even make it past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Telegram,
  Console,
}

impl Channel {
  /// The routing key used when publishing to the direct exchange (§4.9).
  pub fn routing_key(&self) -> &'static str {
    match self {
      Channel::Email => "email",
      Channel::Telegram => "telegram",
      Channel::Console => "console",
    }
  }
}

impl std::fmt::Display for Channel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.routing_key())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
  pub title: String,
  pub message: String,
}

/// The core entity (spec.md §3).
///
/// `publication_at` is compared directly as a `DateTime<Utc>` rather than
/// reparsed from its RFC3339 string form, per the REDESIGN FLAGS note about
/// the original's string-parsed heap comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub id: Uuid,
  pub publication_at: DateTime<Utc>,
  pub channel: Channel,
  pub content: Content,
  pub send_to: String,
  pub sent: bool,
}

impl PartialEq for Notification {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}
impl Eq for Notification {}

/// Ordering used by the consumer's min-heap: earliest `publication_at` first.
/// Ties break arbitrarily (spec.md §4.6), which falls out of comparing only
/// on the timestamp.
impl PartialOrd for Notification {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}
impl Ord for Notification {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.publication_at.cmp(&other.publication_at)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_roundtrips_through_json() {
    let c: Channel = serde_json::from_str("\"email\"").unwrap();
    assert_eq!(c, Channel::Email);
    assert_eq!(serde_json::to_string(&Channel::Telegram).unwrap(), "\"telegram\"");
  }

  #[test]
  fn unknown_channel_is_rejected() {
    let result: Result<Channel, _> = serde_json::from_str("\"carrier_pigeon\"");
    assert!(result.is_err());
  }

  #[test]
  fn ordering_is_by_publication_at_only() {
    let now = Utc::now();
    let earlier = mk_notification(now - chrono::Duration::seconds(5));
    let later = mk_notification(now);
    assert!(earlier < later);
  }

  fn mk_notification(at: DateTime<Utc>) -> Notification {
    Notification {
      id: Uuid::new_v4(),
      publication_at: at,
      channel: Channel::Console,
      content: Content { title: "t".into(), message: "m".into() },
      send_to: String::new(),
      sent: false,
    }
  }
}
