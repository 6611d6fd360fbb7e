// ranmix/src/channel/telegram.rs

//! Telegram Bot API transport.

use super::message::OutboundMessage;
use super::NotificationChannel;
use crate::config::TelegramConfig;
use crate::error::{RanmixError, RanmixResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{event, instrument, Level};

const SERVICE: &str = "telegram";

#[derive(Debug, Serialize)]
struct InlineButton<'a> {
  text: &'a str,
  callback_data: &'a str,
}

#[derive(Debug, Serialize)]
struct ReplyMarkup<'a> {
  inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
  ok: bool,
  #[serde(default)]
  description: Option<String>,
}

pub struct TelegramChannel {
  http: reqwest::Client,
  api_base: String,
  bot_token: String,
  chat_id: String,
}

impl TelegramChannel {
  pub fn new(config: &TelegramConfig) -> RanmixResult<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| RanmixError::Config(format!("HTTP client error: {}", e)))?;
    Ok(Self {
      http,
      api_base: config.api_base.trim_end_matches('/').to_string(),
      bot_token: config.bot_token.clone(),
      chat_id: config.chat_id.clone(),
    })
  }

  fn method_url(&self, method: &str) -> String {
    format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
  }

  /// Acknowledges a button press so the approver's client stops spinning.
  #[instrument(skip(self, text))]
  pub async fn answer_callback(&self, callback_query_id: &str, text: &str) -> RanmixResult<()> {
    let body = json!({
      "callback_query_id": callback_query_id,
      "text": text,
      "show_alert": true,
    });
    self.post_json("answerCallbackQuery", &body).await
  }

  /// Points the bot's updates at `url`.
  #[instrument(skip(self))]
  pub async fn set_webhook(&self, url: &str) -> RanmixResult<()> {
    self.post_json("setWebhook", &json!({ "url": url })).await
  }

  async fn post_json(&self, method: &str, body: &serde_json::Value) -> RanmixResult<()> {
    let response = self
      .http
      .post(self.method_url(method))
      .json(body)
      .send()
      .await
      .map_err(|e| RanmixError::transport(SERVICE, e))?;
    check_response(method, response).await
  }

  fn reply_markup(message: &OutboundMessage) -> Option<ReplyMarkup<'_>> {
    if message.actions.is_empty() {
      return None;
    }
    let row = message
      .actions
      .iter()
      .map(|a| InlineButton {
        text: &a.label,
        callback_data: &a.token,
      })
      .collect();
    Some(ReplyMarkup {
      inline_keyboard: vec![row],
    })
  }
}

async fn check_response(method: &str, response: reqwest::Response) -> RanmixResult<()> {
  let status = response.status();
  let parsed = response.json::<ApiResponse>().await;
  match parsed {
    Ok(api) if api.ok => Ok(()),
    Ok(api) => Err(RanmixError::transport(
      SERVICE,
      format!(
        "{} returned {}: {}",
        method,
        status,
        api.description.unwrap_or_else(|| "no description".into())
      ),
    )),
    Err(e) => Err(RanmixError::transport(
      SERVICE,
      format!("{} returned {} with an unreadable body: {}", method, status, e),
    )),
  }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
  fn name(&self) -> &'static str {
    SERVICE
  }

  #[instrument(name = "TelegramChannel::send", skip_all, fields(with_image = message.image.is_some()))]
  async fn send(&self, message: &OutboundMessage) -> RanmixResult<()> {
    let markup = Self::reply_markup(message);

    let Some(image) = &message.image else {
      let mut body = json!({ "chat_id": self.chat_id, "text": message.text });
      if let Some(markup) = &markup {
        body["reply_markup"] = serde_json::to_value(markup).map_err(|e| RanmixError::transport(SERVICE, e))?;
      }
      return self.post_json("sendMessage", &body).await;
    };

    let photo = Part::bytes(image.bytes.clone())
      .file_name(image.file_name.clone())
      .mime_str(&image.content_type)
      .map_err(|e| RanmixError::Validation(format!("bad evidence content type: {}", e)))?;
    let mut form = Form::new()
      .text("chat_id", self.chat_id.clone())
      .text("caption", message.text.clone())
      .part("photo", photo);
    if let Some(markup) = &markup {
      let encoded = serde_json::to_string(markup).map_err(|e| RanmixError::transport(SERVICE, e))?;
      form = form.text("reply_markup", encoded);
    }

    let response = self
      .http
      .post(self.method_url("sendPhoto"))
      .multipart(form)
      .send()
      .await
      .map_err(|e| RanmixError::transport(SERVICE, e))?;
    event!(Level::DEBUG, status = %response.status(), "sendPhoto answered.");
    check_response("sendPhoto", response).await
  }
}
