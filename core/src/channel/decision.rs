// ranmix/src/channel/decision.rs

//! Writing an inbound decision token back to the order records.

use super::action::DecisionToken;
use crate::error::{RanmixError, RanmixResult};
use crate::order::{DecisionOutcome, Notification, Order, OrderRepository};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tracing::{event, instrument, Level};

/// What to do with a decision that matches no pending order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmatchedDecisionPolicy {
  /// Log and drop it.
  #[default]
  Ignore,
  /// Insert a placeholder order already carrying the decision.
  CreateFallbackRecord,
}

impl FromStr for UnmatchedDecisionPolicy {
  type Err = RanmixError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "ignore" => Ok(UnmatchedDecisionPolicy::Ignore),
      "fallback" => Ok(UnmatchedDecisionPolicy::CreateFallbackRecord),
      other => Err(RanmixError::Config(format!(
        "unmatched decision policy must be 'ignore' or 'fallback', got '{}'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedDecision {
  /// A pending order was decided and a notification recorded.
  Applied(Order),
  /// The order had already been decided; nothing changed.
  Duplicate(Order),
  /// No pending order matched; a placeholder record was created.
  Fallback(Order),
  /// No pending order matched and the token was dropped.
  Ignored,
}

/// Resolves `token` to an order and records the decision at most once.
///
/// The exact order id is tried first, then the customer's most recent pending order.
#[instrument(skip(repo, token), fields(token = %token), err(Display))]
pub async fn apply_decision(
  repo: &dyn OrderRepository,
  token: &DecisionToken,
  policy: UnmatchedDecisionPolicy,
  at: DateTime<Utc>,
) -> RanmixResult<AppliedDecision> {
  let target = match repo.get(&token.order_id()).await? {
    Some(order) => Some(order),
    None => repo.pending_for_customer(&token.customer).await?,
  };

  let Some(target) = target else {
    return match policy {
      UnmatchedDecisionPolicy::Ignore => {
        event!(Level::WARN, customer = %token.customer, "No order matches decision; ignoring.");
        Ok(AppliedDecision::Ignored)
      }
      UnmatchedDecisionPolicy::CreateFallbackRecord => {
        let order = fallback_order(token, at);
        event!(Level::WARN, order_id = %order.id, "No order matches decision; creating fallback record.");
        repo.insert(order.clone()).await?;
        repo.append_notification(Notification::for_transition(&order, at)).await?;
        Ok(AppliedDecision::Fallback(order))
      }
    };
  };

  match repo.record_decision(&target.id, token.decision, at).await? {
    DecisionOutcome::Applied(order) => {
      repo.append_notification(Notification::for_transition(&order, at)).await?;
      event!(Level::INFO, order_id = %order.id, status = %order.status, "Decision applied.");
      Ok(AppliedDecision::Applied(order))
    }
    DecisionOutcome::AlreadyDecided(order) => {
      event!(Level::INFO, order_id = %order.id, status = %order.status, "Duplicate decision ignored.");
      Ok(AppliedDecision::Duplicate(order))
    }
  }
}

fn fallback_order(token: &DecisionToken, at: DateTime<Utc>) -> Order {
  Order {
    id: token.order_id(),
    customer_name: token.customer.clone(),
    email: String::new(),
    phone: String::new(),
    amount: 0,
    payment_method: "unknown".to_string(),
    status: token.decision.resulting_status(),
    created_at: at,
    updated_at: at,
  }
}
