// ranmix/src/channel/mod.rs

//! The human-operated approval channel: outbound payment and staff notices, inbound decisions.

pub mod action;
pub mod client;
pub mod decision;
pub mod memory;
pub mod message;
pub mod staff;
pub mod telegram;

use crate::error::RanmixResult;
use async_trait::async_trait;

pub use action::DecisionToken;
pub use client::{DecisionStrategy, NotificationChannelClient, NotifyReceipt};
pub use decision::{apply_decision, AppliedDecision, UnmatchedDecisionPolicy};
pub use memory::InMemoryChannel;
pub use message::{EvidenceImage, MessageAction, OutboundMessage, MAX_EVIDENCE_BYTES};
pub use staff::QuickBooking;
pub use telegram::TelegramChannel;

/// Transport toward the chat surface the approver watches.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
  /// Short name for logs.
  fn name(&self) -> &'static str;

  /// Delivers `message`; any failure is a `Transport` error.
  async fn send(&self, message: &OutboundMessage) -> RanmixResult<()>;
}
