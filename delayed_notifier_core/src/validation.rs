//! Validates `send_to` against the notification's `channel` (spec.md §3,
//! §8 property 7).
//!
//! This fixes the hazard called out in spec.md §9.5: the original validates
//! `channel.val` on the email path instead of the supplied address. Here
//! `validate_send_to` always inspects the `send_to` argument it was given.

use crate::model::Channel;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("'{0}' is not a valid email address")]
  InvalidEmail(String),
  #[error("'{0}' is not a valid telegram chat id (expected a signed 64-bit integer)")]
  InvalidTelegramChatId(String),
}

/// Validates `send_to` for the given channel. `console` accepts any string,
/// including empty (spec.md §3).
pub fn validate_send_to(channel: Channel, send_to: &str) -> Result<(), ValidationError> {
  match channel {
    Channel::Console => Ok(()),
    Channel::Telegram => send_to
      .parse::<i64>()
      .map(|_| ())
      .map_err(|_| ValidationError::InvalidTelegramChatId(send_to.to_string())),
    Channel::Email => {
      if is_plausible_rfc5322_address(send_to) {
        Ok(())
      } else {
        Err(ValidationError::InvalidEmail(send_to.to_string()))
      }
    }
  }
}

/// A deliberately narrow RFC5322 check: one `@`, a non-empty local part, and
/// a domain part containing at least one `.`. Full RFC5322 parsing is out of
/// scope for a single address field — this matches what the original's
/// validator attempted (a `net/mail`-style address parse), not a complete
/// grammar implementation.
fn is_plausible_rfc5322_address(value: &str) -> bool {
  let Some((local, domain)) = value.split_once('@') else { return false };
  !local.is_empty()
    && !domain.is_empty()
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && !value.contains(' ')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn console_accepts_anything_including_empty() {
    assert!(validate_send_to(Channel::Console, "").is_ok());
    assert!(validate_send_to(Channel::Console, "anything at all").is_ok());
  }

  #[test]
  fn email_accepts_well_formed_address() {
    assert!(validate_send_to(Channel::Email, "user@example.com").is_ok());
  }

  #[test]
  fn email_rejects_malformed_address() {
    assert_eq!(
      validate_send_to(Channel::Email, "not-an-email"),
      Err(ValidationError::InvalidEmail("not-an-email".into()))
    );
  }

  #[test]
  fn telegram_accepts_signed_integer() {
    assert!(validate_send_to(Channel::Telegram, "-100123456789").is_ok());
  }

  #[test]
  fn telegram_rejects_non_integer() {
    assert!(validate_send_to(Channel::Telegram, "not-a-number").is_err());
  }
}
