// ranmix/src/error.rs
use std::time::Duration;
use thiserror::Error;

use crate::workflow::OrderPhase;

#[derive(Debug, Error)]
pub enum RanmixError {
  /// Missing or invalid order/registration fields. Reported locally, no side effects.
  #[error("Validation failed: {0}")]
  Validation(String),

  /// The notification channel could not be reached. The order stays resubmittable.
  #[error("Notification delivery failed for order '{order_id}': {reason}")]
  Delivery { order_id: String, reason: String },

  #[error("Timed out after {waited:?} waiting for {waiting_for}")]
  Timeout { waiting_for: String, waited: Duration },

  /// The generation backend reported a terminal failure. Not retried.
  #[error("Generation job '{job_id}' failed: {reason}")]
  Provider { job_id: String, reason: String },

  #[error("Event {event_id} cannot take registrations: {reason}")]
  Capacity { event_id: u32, reason: String },

  /// Durable local storage could not be written. Logged; the in-memory state is kept.
  #[error("Persistence warning for key '{key}': {reason}")]
  Persistence { key: String, reason: String },

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Cannot {action} while the order is {phase}")]
  InvalidTransition { action: &'static str, phase: OrderPhase },

  #[error("Malformed action token '{token}': {reason}")]
  MalformedToken { token: String, reason: String },

  /// Network or protocol failure talking to an external service. Retryable.
  #[error("Transport error talking to {service}: {reason}")]
  Transport { service: &'static str, reason: String },

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Operation cancelled: the owning session was torn down")]
  Cancelled,

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}

impl RanmixError {
  /// Whether retrying the same operation from the last stable state is safe.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      RanmixError::Delivery { .. } | RanmixError::Timeout { .. } | RanmixError::Transport { .. }
    )
  }

  pub(crate) fn transport(service: &'static str, err: impl std::fmt::Display) -> Self {
    RanmixError::Transport {
      service,
      reason: err.to_string(),
    }
  }
}

pub type RanmixResult<T, E = RanmixError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_transient_failures_are_retryable() {
    let delivery = RanmixError::Delivery {
      order_id: "order_1_minh".into(),
      reason: "connection reset".into(),
    };
    let provider = RanmixError::Provider {
      job_id: "job-1".into(),
      reason: "model crashed".into(),
    };
    assert!(delivery.is_retryable());
    assert!(RanmixError::transport("generation provider", "502").is_retryable());
    assert!(!provider.is_retryable());
    assert!(!RanmixError::Validation("name is required".into()).is_retryable());
  }
}
