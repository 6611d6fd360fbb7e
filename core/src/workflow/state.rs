// ranmix/src/workflow/state.rs

use crate::channel::EvidenceImage;
use crate::error::{RanmixError, RanmixResult};
use crate::generation::GenerationJob;
use crate::order::OrderStatus;
use std::fmt;
use std::time::Duration;

/// Where a session stands.
///
/// `Created -> Submitted -> PendingApproval -> Approved | Rejected`, and from `Approved`:
/// `GenerationRequested -> GenerationInProgress -> GenerationCompleted | GenerationFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderPhase {
  Created,
  Submitted,
  PendingApproval,
  Approved,
  Rejected,
  GenerationRequested,
  GenerationInProgress,
  GenerationCompleted,
  GenerationFailed,
}

impl OrderPhase {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderPhase::Created => "created",
      OrderPhase::Submitted => "submitted",
      OrderPhase::PendingApproval => "pending_approval",
      OrderPhase::Approved => "approved",
      OrderPhase::Rejected => "rejected",
      OrderPhase::GenerationRequested => "generation_requested",
      OrderPhase::GenerationInProgress => "generation_in_progress",
      OrderPhase::GenerationCompleted => "generation_completed",
      OrderPhase::GenerationFailed => "generation_failed",
    }
  }

  /// Phases from which a generation request may (re)start.
  pub fn can_request_generation(&self) -> bool {
    matches!(self, OrderPhase::Approved | OrderPhase::GenerationFailed)
  }
}

impl fmt::Display for OrderPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Contact details and evidence collected by the payment form.
#[derive(Debug, Clone, Default)]
pub struct PaymentForm {
  pub customer_name: String,
  pub email: String,
  pub phone: String,
  /// Smallest currency unit.
  pub amount: u64,
  pub payment_method: String,
  pub evidence: Option<EvidenceImage>,
}

impl PaymentForm {
  pub fn validate(&self) -> RanmixResult<()> {
    if self.customer_name.trim().is_empty() {
      return Err(RanmixError::Validation("customer name is required".into()));
    }
    if self.phone.trim().is_empty() && self.email.trim().is_empty() {
      return Err(RanmixError::Validation("a phone number or email is required".into()));
    }
    if self.amount == 0 {
      return Err(RanmixError::Validation("amount must be greater than zero".into()));
    }
    match &self.evidence {
      None => Err(RanmixError::Validation("payment evidence image is required".into())),
      Some(image) if image.is_empty() => Err(RanmixError::Validation("payment evidence image is empty".into())),
      Some(_) => Ok(()),
    }
  }
}

/// What the UI renders for a session. Published on every transition and poll.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
  pub phase: OrderPhase,
  pub order_id: Option<String>,
  pub order_status: Option<OrderStatus>,
  pub job: Option<GenerationJob>,
  pub poll_attempt: Option<(u32, u32)>,
  pub poll_elapsed: Option<Duration>,
  pub last_error: Option<String>,
}

impl SessionSnapshot {
  pub(crate) fn initial() -> Self {
    Self {
      phase: OrderPhase::Created,
      order_id: None,
      order_status: None,
      job: None,
      poll_attempt: None,
      poll_elapsed: None,
      last_error: None,
    }
  }
}
