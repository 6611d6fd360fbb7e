// apps/approval_webhook/src/models/telegram.rs

use serde::Deserialize;

/// The subset of a bot `Update` this server acts on. Other update kinds deserialize with
/// `callback_query: None` and are acknowledged without further work.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
  pub update_id: i64,
  #[serde(default)]
  pub callback_query: Option<CallbackQuery>,
}

/// A press on one of the inline approve/reject buttons.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
  pub id: String,
  pub from: TelegramUser,
  /// The button's opaque action token.
  #[serde(default)]
  pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
  pub id: i64,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub username: Option<String>,
}

impl TelegramUser {
  pub fn display_name(&self) -> String {
    match &self.username {
      Some(username) => format!("@{}", username),
      None => self.first_name.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_button_press() {
    let raw = r#"{
      "update_id": 918273,
      "callback_query": {
        "id": "4382bfdwdsb323b2d9",
        "from": {"id": 1111, "is_bot": false, "first_name": "Lan", "username": "lan_ops"},
        "message": {"message_id": 42, "chat": {"id": -100200300}},
        "chat_instance": "-5432",
        "data": "approve_1780304400000_Minh Anh"
      }
    }"#;
    let update: TelegramUpdate = serde_json::from_str(raw).unwrap();
    let query = update.callback_query.unwrap();
    assert_eq!(query.data.as_deref(), Some("approve_1780304400000_Minh Anh"));
    assert_eq!(query.from.display_name(), "@lan_ops");
  }

  #[test]
  fn other_updates_carry_no_callback() {
    let raw = r#"{"update_id": 5, "message": {"message_id": 1, "text": "hello"}}"#;
    let update: TelegramUpdate = serde_json::from_str(raw).unwrap();
    assert!(update.callback_query.is_none());
  }
}
