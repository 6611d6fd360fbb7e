// ranmix/src/channel/memory.rs

use super::message::OutboundMessage;
use super::NotificationChannel;
use crate::error::{RanmixError, RanmixResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records every delivered message. Useful offline and in tests.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
  sent: Mutex<Vec<OutboundMessage>>,
  failures_remaining: AtomicUsize,
  attempts: AtomicUsize,
}

impl InMemoryChannel {
  pub fn new() -> Self {
    Self::default()
  }

  /// The next `n` sends fail with a transport error.
  pub fn fail_next(&self, n: usize) {
    self.failures_remaining.store(n, Ordering::SeqCst);
  }

  pub fn sent(&self) -> Vec<OutboundMessage> {
    self.sent.lock().clone()
  }

  pub fn last_sent(&self) -> Option<OutboundMessage> {
    self.sent.lock().last().cloned()
  }

  /// Successful and failed sends alike.
  pub fn attempts(&self) -> usize {
    self.attempts.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl NotificationChannel for InMemoryChannel {
  fn name(&self) -> &'static str {
    "in-memory"
  }

  async fn send(&self, message: &OutboundMessage) -> RanmixResult<()> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    let should_fail = self
      .failures_remaining
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if should_fail {
      return Err(RanmixError::transport("in-memory channel", "simulated network error"));
    }
    self.sent.lock().push(message.clone());
    Ok(())
  }
}
