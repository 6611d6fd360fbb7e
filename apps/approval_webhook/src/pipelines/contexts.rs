// apps/approval_webhook/src/pipelines/contexts.rs

//! Context data for the callback pipeline. Handlers receive it wrapped in `ranmix::ContextData`.

use crate::models::TelegramUpdate;
use ranmix::channel::AppliedDecision;
use ranmix::{ContextData, DecisionToken};

/// One inbound bot update on its way through `parse_callback -> apply_decision ->
/// answer_callback_query -> acknowledge`.
#[derive(Debug, Clone)]
pub struct DecisionCtxData {
  pub update_id: i64,
  pub callback_query_id: Option<String>,
  pub approver: Option<String>,
  pub raw_action: Option<String>,
  // Filled in by the pipeline:
  pub token: Option<DecisionToken>,
  pub outcome: Option<AppliedDecision>,
  /// Shown to the approver as the callback answer.
  pub reply_text: Option<String>,
  pub acknowledged: bool,
}

impl DecisionCtxData {
  pub fn from_update(update: TelegramUpdate) -> Self {
    let (callback_query_id, approver, raw_action) = match update.callback_query {
      Some(query) => (Some(query.id), Some(query.from.display_name()), query.data),
      None => (None, None, None),
    };
    Self {
      update_id: update.update_id,
      callback_query_id,
      approver,
      raw_action,
      token: None,
      outcome: None,
      reply_text: None,
      acknowledged: false,
    }
  }
}

pub type DecisionCtx = ContextData<DecisionCtxData>;
