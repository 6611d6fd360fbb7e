// ranmix/src/order/model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Approved,
  Rejected,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Approved => "approved",
      OrderStatus::Rejected => "rejected",
    }
  }

  pub fn is_decided(&self) -> bool {
    !matches!(self, OrderStatus::Pending)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "approved" => Ok(OrderStatus::Approved),
      "rejected" => Ok(OrderStatus::Rejected),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

/// The approver's go/no-go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Approve,
  Reject,
}

impl Decision {
  pub fn resulting_status(self) -> OrderStatus {
    match self {
      Decision::Approve => OrderStatus::Approved,
      Decision::Reject => OrderStatus::Rejected,
    }
  }
}

/// `order_<unix-millis>_<customer>`.
pub fn order_id(created_millis: i64, customer: &str) -> String {
  format!("order_{}_{}", created_millis, customer)
}

/// A payment-evidence submission awaiting (or past) human approval.
///
/// Only `pending -> approved` and `pending -> rejected` are legal; a decided order only ever
/// changes its `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: String,
  pub customer_name: String,
  pub email: String,
  pub phone: String,
  /// Smallest currency unit.
  pub amount: u64,
  pub payment_method: String,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn is_pending(&self) -> bool {
    self.status == OrderStatus::Pending
  }
}

/// What happened when a decision was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
  Applied(Order),
  /// The order had already been decided; the record is returned unchanged.
  AlreadyDecided(Order),
}

impl DecisionOutcome {
  pub fn order(&self) -> &Order {
    match self {
      DecisionOutcome::Applied(o) | DecisionOutcome::AlreadyDecided(o) => o,
    }
  }

  pub fn was_applied(&self) -> bool {
    matches!(self, DecisionOutcome::Applied(_))
  }
}

/// An order together with its notification history, as served by the order API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
  pub order: Order,
  #[serde(default)]
  pub notifications: Vec<Notification>,
}

/// Body of `POST /orders/{id}/decision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
  pub decision: Decision,
  pub at: DateTime<Utc>,
}

/// Answer to a decision request: `applied` is false when the order was already decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReply {
  pub applied: bool,
  pub order: Order,
}

impl From<DecisionOutcome> for DecisionReply {
  fn from(outcome: DecisionOutcome) -> Self {
    Self {
      applied: outcome.was_applied(),
      order: outcome.order().clone(),
    }
  }
}

impl From<DecisionReply> for DecisionOutcome {
  fn from(reply: DecisionReply) -> Self {
    if reply.applied {
      DecisionOutcome::Applied(reply.order)
    } else {
      DecisionOutcome::AlreadyDecided(reply.order)
    }
  }
}

/// One row per order-status transition. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub order_id: String,
  pub customer_name: String,
  pub status: OrderStatus,
  pub message: String,
  pub created_at: DateTime<Utc>,
}

impl Notification {
  pub fn for_transition(order: &Order, at: DateTime<Utc>) -> Self {
    let message = match order.status {
      OrderStatus::Approved => "Payment confirmed! You can start creating your AI track.",
      OrderStatus::Rejected => "Payment rejected. Please check your payment details.",
      OrderStatus::Pending => "Payment received and waiting for confirmation.",
    };
    Self {
      order_id: order.id.clone(),
      customer_name: order.customer_name.clone(),
      status: order.status,
      message: message.to_string(),
      created_at: at,
    }
  }
}
