// ranmix/src/channel/action.rs

//! Decision tokens carried by the approve/reject buttons.

use crate::error::RanmixError;
use crate::order::{order_id, Decision};
use std::fmt;
use std::str::FromStr;

/// `<approve|reject>_<unix-millis>_<customer>`. The customer part may contain `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionToken {
  pub decision: Decision,
  pub created_millis: i64,
  pub customer: String,
}

impl DecisionToken {
  pub fn new(decision: Decision, created_millis: i64, customer: impl Into<String>) -> Self {
    Self {
      decision,
      created_millis,
      customer: customer.into(),
    }
  }

  /// The order this token was minted for.
  pub fn order_id(&self) -> String {
    order_id(self.created_millis, &self.customer)
  }
}

impl fmt::Display for DecisionToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let action = match self.decision {
      Decision::Approve => "approve",
      Decision::Reject => "reject",
    };
    write!(f, "{}_{}_{}", action, self.created_millis, self.customer)
  }
}

impl FromStr for DecisionToken {
  type Err = RanmixError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let malformed = |reason: &str| RanmixError::MalformedToken {
      token: raw.to_string(),
      reason: reason.to_string(),
    };

    let mut parts = raw.splitn(3, '_');
    let decision = match parts.next() {
      Some("approve") => Decision::Approve,
      Some("reject") => Decision::Reject,
      _ => return Err(malformed("action must be 'approve' or 'reject'")),
    };
    let created_millis = parts
      .next()
      .and_then(|ts| ts.parse::<i64>().ok())
      .ok_or_else(|| malformed("missing or non-numeric timestamp"))?;
    let customer = parts
      .next()
      .filter(|c| !c.trim().is_empty())
      .ok_or_else(|| malformed("missing customer identifier"))?;

    Ok(Self::new(decision, created_millis, customer))
  }
}
