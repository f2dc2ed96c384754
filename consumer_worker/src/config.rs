//! Grounded on `delayed_notifier/src/config.rs`'s `AppConfig::load` (same
//! 3-way YAML fallback plus `CW_`-prefixed environment override pass),
//! reshaped around this service's own sections: the bus, the per-channel
//! senders, and the heap dispatcher's `check_period`.

use anyhow::{bail, Context, Result};
use delayed_notifier_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::{env, fs::File};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
  pub log_level: Option<String>,
  pub bus: BusConfig,
  pub senders: SendersConfig,
  #[serde(default = "default_check_period_ms")]
  pub check_period_ms: u64,
}

fn default_check_period_ms() -> u64 {
  50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
  pub host: String,
  pub port: u16,
  pub user: String,
  pub password: String,
  #[serde(default = "default_vhost")]
  pub vhost: String,
  pub exchange: String,
  pub queue: String,
  pub consumer_tag: String,
  #[serde(default = "default_auto_ack")]
  pub auto_ack: bool,
  #[serde(default)]
  pub no_wait: bool,
  #[serde(default)]
  pub retry: RetryPolicy,
}

fn default_vhost() -> String {
  "/".to_string()
}
// Same open-question #4 resolution as the producer: auto-ack by default
// (spec.md §9.4), since the worker's own at-least-once coverage comes from
// the producer's `sent` flag, not redelivery.
fn default_auto_ack() -> bool {
  true
}

impl BusConfig {
  pub fn amqp_uri(&self) -> String {
    format!("amqp://{}:{}@{}:{}{}", self.user, self.password, self.host, self.port, self.vhost)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendersConfig {
  pub email: EmailSenderConfig,
  #[serde(default)]
  pub telegram: TelegramSenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSenderConfig {
  pub from: String,
  pub password: String,
  pub host: String,
  pub port: u16,
  #[serde(default)]
  pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramSenderConfig {
  #[serde(default)]
  pub bot_token: Option<String>,
  #[serde(default)]
  pub retry: RetryPolicy,
}

impl AppConfig {
  pub fn load() -> Result<Self> {
    let raw: serde_yaml::Value = match (
      File::open("consumer.yml"),
      File::open("/etc/config/consumer.yml"),
      env::var("CW_CONFIG"),
    ) {
      (Ok(reader), _, _) => serde_yaml::from_reader(reader)?,
      (_, Ok(reader), _) => serde_yaml::from_reader(reader)?,
      (_, _, Ok(path)) => {
        serde_yaml::from_reader(File::open(&path).with_context(|| format!("opening {path}"))?)?
      }
      _ => bail!("config file not found: expected ./consumer.yml, /etc/config/consumer.yml, or $CW_CONFIG"),
    };

    let overridden = apply_env_overrides(raw, "CW_");
    let config: AppConfig = serde_yaml::from_value(overridden)?;
    Ok(config)
  }
}

fn apply_env_overrides(mut value: serde_yaml::Value, prefix: &str) -> serde_yaml::Value {
  for (key, val) in env::vars() {
    let Some(rest) = key.strip_prefix(prefix) else { continue };
    let path: Vec<String> = rest.to_lowercase().split('_').map(str::to_string).collect();
    set_path(&mut value, &path, val);
  }
  value
}

fn set_path(value: &mut serde_yaml::Value, path: &[String], new_value: String) {
  use serde_yaml::Value;
  let Value::Mapping(map) = value else { return };
  if path.len() == 1 {
    map.insert(Value::String(path[0].clone()), Value::String(new_value));
    return;
  }
  let key = Value::String(path[0].clone());
  let entry = map.entry(key).or_insert_with(|| Value::Mapping(Default::default()));
  set_path(entry, &path[1..], new_value);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn env_override_sets_nested_field() {
    let yaml = serde_yaml::from_str::<serde_yaml::Value>("bus:\n  host: localhost\n").unwrap();
    let mut value = yaml;
    set_path(&mut value, &["bus".into(), "host".into()], "rabbitmq".into());
    assert_eq!(value["bus"]["host"], serde_yaml::Value::String("rabbitmq".into()));
  }

  #[test]
  fn default_auto_ack_is_true() {
    assert!(default_auto_ack());
  }
}
