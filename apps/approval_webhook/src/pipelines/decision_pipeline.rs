// apps/approval_webhook/src/pipelines/decision_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::{DecisionCtx, DecisionCtxData};
use chrono::Utc;
use ranmix::channel::{apply_decision, AppliedDecision, TelegramChannel};
use ranmix::order::OrderRepository;
use ranmix::pipeline::SkipCondition;
use ranmix::{DecisionToken, OrderStatus, Pipeline, PipelineControl, UnmatchedDecisionPolicy};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Collaborators captured by the pipeline's handlers.
pub struct DecisionDeps {
  pub orders: Arc<dyn OrderRepository>,
  /// `None` leaves `answer_callback_query` without handlers, so the optional step is skipped.
  pub telegram: Option<Arc<TelegramChannel>>,
  pub policy: UnmatchedDecisionPolicy,
}

const UNRECOGNISED_ACTION: &str = "Unrecognised action.";
const RECORDING_FAILED: &str = "Could not record the decision. Please try again.";

fn no_token(ctx: DecisionCtx) -> bool {
  ctx.read().token.is_none()
}

/// Text shown to the approver after their button press.
pub fn reply_for(outcome: &AppliedDecision, token: &DecisionToken) -> String {
  match outcome {
    AppliedDecision::Applied(order) => match order.status {
      OrderStatus::Approved => format!("✅ Payment confirmed for {}.", order.customer_name),
      OrderStatus::Rejected => format!("❌ Payment rejected for {}.", order.customer_name),
      OrderStatus::Pending => "Decision recorded.".to_string(),
    },
    AppliedDecision::Duplicate(order) => format!("Order {} was already {}.", order.id, order.status),
    AppliedDecision::Fallback(order) => format!(
      "No pending order found; recorded {} for {}.",
      order.status, order.customer_name
    ),
    AppliedDecision::Ignored => format!("No pending order found for {}.", token.customer),
  }
}

/// Builds the callback pipeline. Malformed or unmatched callbacks never fail it; storage errors
/// are turned into a retry hint for the approver so the transport is still acknowledged.
pub fn build_decision_pipeline(deps: DecisionDeps) -> Pipeline<DecisionCtxData, AppError> {
  let skip_without_token: SkipCondition<DecisionCtxData> = Arc::new(no_token);
  let mut p = Pipeline::<DecisionCtxData, AppError>::new(&[
    ("parse_callback", false, None),
    ("apply_decision", false, Some(skip_without_token)),
    ("answer_callback_query", true, None),
    ("acknowledge", false, None),
  ]);

  // Step 1: Parse the action token carried by the button.
  p.on_root("parse_callback", |ctx: DecisionCtx| async move {
    let (update_id, query_id, raw) = {
      let guard = ctx.read();
      (guard.update_id, guard.callback_query_id.clone(), guard.raw_action.clone())
    };

    if query_id.is_none() {
      info!(update_id, "Update carries no button press; nothing to apply.");
      return Ok::<_, AppError>(PipelineControl::Stop);
    }

    match raw.as_deref().map(str::parse::<DecisionToken>) {
      Some(Ok(token)) => {
        info!(update_id, order_id = %token.order_id(), decision = ?token.decision, "Decision token parsed.");
        ctx.write().token = Some(token);
      }
      Some(Err(e)) => {
        warn!(update_id, error = %e, "Rejecting malformed decision token.");
        ctx.write().reply_text = Some(UNRECOGNISED_ACTION.to_string());
      }
      None => {
        warn!(update_id, "Button press carried no action token.");
        ctx.write().reply_text = Some(UNRECOGNISED_ACTION.to_string());
      }
    }
    Ok(PipelineControl::Continue)
  });

  // Step 2: Write the decision into the order records.
  let orders = deps.orders.clone();
  let policy = deps.policy;
  p.on_root("apply_decision", move |ctx: DecisionCtx| {
    let orders = orders.clone();
    async move {
      let (token, approver) = {
        let guard = ctx.read();
        (guard.token.clone(), guard.approver.clone())
      };
      let Some(token) = token else {
        return Ok::<_, AppError>(PipelineControl::Continue);
      };

      match apply_decision(orders.as_ref(), &token, policy, Utc::now()).await {
        Ok(outcome) => {
          info!(approver = ?approver, outcome = ?outcome, "Decision processed.");
          let mut guard = ctx.write();
          guard.reply_text = Some(reply_for(&outcome, &token));
          guard.outcome = Some(outcome);
        }
        Err(e) => {
          error!(approver = ?approver, error = %e, "Failed to record decision.");
          ctx.write().reply_text = Some(RECORDING_FAILED.to_string());
        }
      }
      Ok(PipelineControl::Continue)
    }
  });

  // Step 3 (optional): Stop the approver's button spinner.
  if let Some(telegram) = deps.telegram {
    p.on_root("answer_callback_query", move |ctx: DecisionCtx| {
      let telegram = telegram.clone();
      async move {
        let (query_id, text) = {
          let guard = ctx.read();
          (guard.callback_query_id.clone(), guard.reply_text.clone())
        };
        if let Some(query_id) = query_id {
          let text = text.unwrap_or_else(|| "Received.".to_string());
          if let Err(e) = telegram.answer_callback(&query_id, &text).await {
            warn!(error = %e, "Could not answer callback query.");
          }
        }
        Ok::<_, AppError>(PipelineControl::Continue)
      }
    });
  }

  // Step 4: Mark the update as handled.
  p.on_root("acknowledge", |ctx: DecisionCtx| async move {
    let update_id = {
      let mut guard = ctx.write();
      guard.acknowledged = true;
      guard.update_id
    };
    info!(update_id, "Callback acknowledged.");
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::TelegramUpdate;
  use chrono::TimeZone;
  use ranmix::order::{order_id, MemoryOrderRepository};
  use ranmix::{ContextData, Order, PipelineResult};

  fn update(data: Option<&str>) -> TelegramUpdate {
    let data = data.map(|d| format!(r#", "data": "{}""#, d)).unwrap_or_default();
    let raw = format!(
      r#"{{"update_id": 7, "callback_query": {{"id": "cbq-1", "from": {{"id": 1, "first_name": "Lan"}}{}}}}}"#,
      data
    );
    serde_json::from_str(&raw).unwrap()
  }

  fn pending_order(repo_millis: i64, customer: &str) -> Order {
    let at = Utc.timestamp_millis_opt(repo_millis).unwrap();
    Order {
      id: order_id(repo_millis, customer),
      customer_name: customer.to_string(),
      email: String::new(),
      phone: "0901234567".to_string(),
      amount: 50_000,
      payment_method: "bank transfer".to_string(),
      status: OrderStatus::Pending,
      created_at: at,
      updated_at: at,
    }
  }

  fn pipeline(repo: Arc<MemoryOrderRepository>, policy: UnmatchedDecisionPolicy) -> Pipeline<DecisionCtxData, AppError> {
    build_decision_pipeline(DecisionDeps {
      orders: repo,
      telegram: None,
      policy,
    })
  }

  #[tokio::test]
  async fn approve_press_decides_the_order() {
    let repo = Arc::new(MemoryOrderRepository::new());
    let order = pending_order(1_780_304_400_000, "Minh");
    repo.insert(order.clone()).await.unwrap();

    let p = pipeline(repo.clone(), UnmatchedDecisionPolicy::Ignore);
    let ctx = ContextData::new(DecisionCtxData::from_update(update(Some("approve_1780304400000_Minh"))));
    let result = p.run(ctx.clone()).await.unwrap();

    assert_eq!(result, PipelineResult::Completed);
    let guard = ctx.read();
    assert!(guard.acknowledged);
    assert_eq!(guard.reply_text.as_deref(), Some("✅ Payment confirmed for Minh."));
    assert_eq!(repo.get(&order.id).await.unwrap().unwrap().status, OrderStatus::Approved);
  }

  #[tokio::test]
  async fn malformed_token_is_acknowledged_without_writes() {
    let repo = Arc::new(MemoryOrderRepository::new());
    let p = pipeline(repo.clone(), UnmatchedDecisionPolicy::CreateFallbackRecord);
    let ctx = ContextData::new(DecisionCtxData::from_update(update(Some("maybe_later"))));

    assert_eq!(p.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
    let guard = ctx.read();
    assert!(guard.acknowledged);
    assert!(guard.outcome.is_none());
    assert_eq!(guard.reply_text.as_deref(), Some(UNRECOGNISED_ACTION));
    assert!(repo.all_orders().is_empty());
  }

  #[tokio::test]
  async fn unmatched_press_follows_the_policy() {
    let repo = Arc::new(MemoryOrderRepository::new());
    let ignore = pipeline(repo.clone(), UnmatchedDecisionPolicy::Ignore);
    let ctx = ContextData::new(DecisionCtxData::from_update(update(Some("reject_1780304400000_Ghost"))));
    ignore.run(ctx.clone()).await.unwrap();
    assert!(matches!(ctx.read().outcome, Some(AppliedDecision::Ignored)));
    assert!(repo.all_orders().is_empty());

    let fallback = pipeline(repo.clone(), UnmatchedDecisionPolicy::CreateFallbackRecord);
    let ctx = ContextData::new(DecisionCtxData::from_update(update(Some("reject_1780304400000_Ghost"))));
    fallback.run(ctx.clone()).await.unwrap();
    assert!(matches!(ctx.read().outcome, Some(AppliedDecision::Fallback(_))));
    assert_eq!(repo.all_orders().len(), 1);
  }

  #[tokio::test]
  async fn non_callback_updates_stop_early() {
    let repo = Arc::new(MemoryOrderRepository::new());
    let p = pipeline(repo, UnmatchedDecisionPolicy::Ignore);
    let plain: TelegramUpdate = serde_json::from_str(r#"{"update_id": 9}"#).unwrap();
    let ctx = ContextData::new(DecisionCtxData::from_update(plain));
    assert_eq!(p.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
    assert!(!ctx.read().acknowledged);
  }
}
