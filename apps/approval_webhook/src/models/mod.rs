// apps/approval_webhook/src/models/mod.rs

//! Wire payloads from the bot API and database rows.

pub mod payment_order;
pub mod telegram;

pub use payment_order::{NotificationRow, PaymentOrderRow};
pub use telegram::{CallbackQuery, TelegramUpdate, TelegramUser};
