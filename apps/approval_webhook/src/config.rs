// apps/approval_webhook/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use ranmix::config::TelegramConfig;
use ranmix::UnmatchedDecisionPolicy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  /// Without a bot token, callbacks are still recorded but never answered.
  pub telegram: Option<TelegramConfig>,
  /// Public URL registered with the bot on startup, when set.
  pub telegram_webhook_url: Option<String>,

  pub unmatched_policy: UnmatchedDecisionPolicy,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;

    let telegram = get_env("TELEGRAM_BOT_TOKEN").ok().map(|bot_token| TelegramConfig {
      bot_token,
      // Answering callbacks does not need the approver chat.
      chat_id: get_env("TELEGRAM_CHAT_ID").unwrap_or_default(),
      api_base: get_env("TELEGRAM_API_BASE").unwrap_or_else(|_| "https://api.telegram.org".to_string()),
    });
    let telegram_webhook_url = get_env("TELEGRAM_WEBHOOK_URL").ok();

    let unmatched_policy = match get_env("UNMATCHED_DECISION_POLICY") {
      Ok(raw) => raw.parse::<UnmatchedDecisionPolicy>()?,
      Err(_) => UnmatchedDecisionPolicy::default(),
    };

    tracing::info!(
      telegram = telegram.is_some(),
      policy = ?unmatched_policy,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      telegram,
      telegram_webhook_url,
      unmatched_policy,
    })
  }
}
