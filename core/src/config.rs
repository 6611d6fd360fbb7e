// ranmix/src/config.rs

//! Runtime configuration read from the environment (optionally via a `.env` file).

use crate::error::{RanmixError, RanmixResult};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
  pub bot_token: String,
  pub chat_id: String,
  pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
  pub api_base: String,
  pub api_key: String,
  pub poll_interval: Duration,
  pub max_attempts: u32,
}

/// Where the shared order records live when they are not process-local.
#[derive(Debug, Clone)]
pub struct OrderApiConfig {
  /// Base of the approval server's API, e.g. `https://pay.example.com/api/v1`.
  pub api_base: String,
}

/// Timing knobs for an approval-gated session.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
  pub approval_window: Duration,
  pub decision_poll_interval: Duration,
}

impl Default for WorkflowConfig {
  fn default() -> Self {
    Self {
      approval_window: Duration::from_secs(300),
      decision_poll_interval: Duration::from_secs(3),
    }
  }
}

#[derive(Debug, Clone)]
pub struct RanmixConfig {
  /// `None` when no bot token is configured; callers fall back to an in-memory channel.
  pub telegram: Option<TelegramConfig>,
  /// `None` when no generation key is configured; callers fall back to the simulated provider.
  pub generation: Option<GenerationConfig>,
  /// `None` keeps orders in memory; sessions then follow the in-process change feed.
  pub order_api: Option<OrderApiConfig>,
  pub workflow: WorkflowConfig,
  pub storage_dir: Option<PathBuf>,
  pub event_tick: Duration,
}

impl RanmixConfig {
  pub fn from_env() -> RanmixResult<Self> {
    dotenvy::dotenv().ok();

    let get_env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    let get_secs = |key: &str, default: u64| -> RanmixResult<Duration> {
      match get_env(key) {
        Some(raw) => parse_positive(key, &raw).map(Duration::from_secs),
        None => Ok(Duration::from_secs(default)),
      }
    };

    let telegram = match get_env("TELEGRAM_BOT_TOKEN") {
      Some(bot_token) => Some(TelegramConfig {
        bot_token,
        chat_id: get_env("TELEGRAM_CHAT_ID")
          .ok_or_else(|| RanmixError::Config("TELEGRAM_CHAT_ID must be set with TELEGRAM_BOT_TOKEN".into()))?,
        api_base: get_env("TELEGRAM_API_BASE").unwrap_or_else(|| "https://api.telegram.org".to_string()),
      }),
      None => None,
    };

    let generation = match get_env("GENERATION_API_KEY") {
      Some(api_key) => Some(GenerationConfig {
        api_base: get_env("GENERATION_API_BASE").unwrap_or_else(|| "https://api.kie.ai/v1/suno".to_string()),
        api_key,
        poll_interval: get_secs("GENERATION_POLL_INTERVAL_SECS", 5)?,
        max_attempts: match get_env("GENERATION_MAX_ATTEMPTS") {
          Some(raw) => u32::try_from(parse_positive("GENERATION_MAX_ATTEMPTS", &raw)?)
            .map_err(|e| RanmixError::Config(format!("GENERATION_MAX_ATTEMPTS is too large: {}", e)))?,
          None => 60,
        },
      }),
      None => None,
    };

    let order_api = get_env("ORDER_API_BASE").map(|api_base| OrderApiConfig { api_base });

    let workflow = WorkflowConfig {
      approval_window: get_secs("APPROVAL_WINDOW_SECS", 300)?,
      decision_poll_interval: get_secs("DECISION_POLL_INTERVAL_SECS", 3)?,
    };

    Ok(Self {
      telegram,
      generation,
      order_api,
      workflow,
      storage_dir: get_env("STORAGE_DIR").map(PathBuf::from),
      event_tick: get_secs("EVENT_TICK_SECS", 30)?,
    })
  }
}

impl Default for RanmixConfig {
  fn default() -> Self {
    Self {
      telegram: None,
      generation: None,
      order_api: None,
      workflow: WorkflowConfig::default(),
      storage_dir: None,
      event_tick: Duration::from_secs(30),
    }
  }
}

/// Zero is refused: every numeric knob is a period or a budget.
fn parse_positive(key: &str, raw: &str) -> RanmixResult<u64> {
  match raw.trim().parse::<u64>() {
    Ok(0) => Err(RanmixError::Config(format!("{} must be greater than zero", key))),
    Ok(value) => Ok(value),
    Err(e) => Err(RanmixError::Config(format!("{} must be a positive integer: {}", key, e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_and_garbage_are_refused() {
    assert_eq!(parse_positive("EVENT_TICK_SECS", " 30 ").unwrap(), 30);
    assert!(matches!(
      parse_positive("EVENT_TICK_SECS", "0"),
      Err(RanmixError::Config(m)) if m.contains("greater than zero")
    ));
    assert!(matches!(parse_positive("GENERATION_MAX_ATTEMPTS", "-3"), Err(RanmixError::Config(_))));
    assert!(matches!(parse_positive("DECISION_POLL_INTERVAL_SECS", "soon"), Err(RanmixError::Config(_))));
  }
}
