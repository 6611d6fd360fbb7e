// ranmix/src/channel/client.rs

//! `NotificationChannelClient`: formats payment notices and observes the approver's decision.

use super::action::DecisionToken;
use super::message::{EvidenceImage, MessageAction, OutboundMessage};
use super::staff::{quick_booking_message, registration_message, QuickBooking};
use super::NotificationChannel;
use chrono::{DateTime, Utc};
use crate::cart::format_price;
use crate::config::WorkflowConfig;
use crate::error::{RanmixError, RanmixResult};
use crate::events::{Event, EventRegistration};
use crate::order::{Decision, Order, OrderBackend, OrderStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

/// How `await_decision` learns about the approver's choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionStrategy {
  /// Follow the order change feed and resolve on the first decided write.
  Push,
  /// Re-read the order record every `interval`.
  Poll { interval: Duration },
}

impl DecisionStrategy {
  /// Polling at the configured decision interval.
  pub fn poll(config: &WorkflowConfig) -> Self {
    DecisionStrategy::Poll {
      interval: config.decision_poll_interval,
    }
  }
}

/// Outcome of a `notify` call. Delivery failures are reported here, not as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReceipt {
  pub delivered: bool,
  pub order_id: String,
  pub failure: Option<String>,
}

#[derive(Clone)]
pub struct NotificationChannelClient {
  channel: Arc<dyn NotificationChannel>,
  orders: Arc<dyn OrderBackend>,
}

impl NotificationChannelClient {
  pub fn new(channel: Arc<dyn NotificationChannel>, orders: Arc<dyn OrderBackend>) -> Self {
    Self { channel, orders }
  }

  pub fn orders(&self) -> &Arc<dyn OrderBackend> {
    &self.orders
  }

  /// Sends the payment notice with approve/reject actions tagged for `order`.
  #[instrument(
    name = "NotificationChannelClient::notify",
    skip_all,
    fields(order_id = %order.id, channel = self.channel.name(), with_image = evidence.is_some())
  )]
  pub async fn notify(&self, order: &Order, evidence: Option<&EvidenceImage>) -> NotifyReceipt {
    let message = payment_message(order, evidence.cloned());
    match self.channel.send(&message).await {
      Ok(()) => {
        event!(Level::INFO, "Payment notice delivered.");
        NotifyReceipt {
          delivered: true,
          order_id: order.id.clone(),
          failure: None,
        }
      }
      Err(e) => {
        event!(Level::WARN, error = %e, "Payment notice not delivered.");
        NotifyReceipt {
          delivered: false,
          order_id: order.id.clone(),
          failure: Some(e.to_string()),
        }
      }
    }
  }

  /// Tells the staff chat about a new event registration. A failure is logged and reported as
  /// `false`; the registration itself stands.
  #[instrument(
    name = "NotificationChannelClient::notify_registration",
    skip_all,
    fields(event_id = event.id, attendee = %registration.customer_name)
  )]
  pub async fn notify_registration(&self, event: &Event, registration: &EventRegistration) -> bool {
    self.deliver_notice(registration_message(event, registration)).await
  }

  /// Validates `booking` and forwards it to the staff chat.
  #[instrument(name = "NotificationChannelClient::notify_quick_booking", skip_all, fields(branch = %booking.branch))]
  pub async fn notify_quick_booking(&self, booking: &QuickBooking, at: DateTime<Utc>) -> RanmixResult<bool> {
    booking.validate()?;
    Ok(self.deliver_notice(quick_booking_message(booking, at)).await)
  }

  async fn deliver_notice(&self, message: OutboundMessage) -> bool {
    match self.channel.send(&message).await {
      Ok(()) => {
        event!(Level::INFO, "Staff notice delivered.");
        true
      }
      Err(e) => {
        event!(Level::WARN, error = %e, "Staff notice not delivered.");
        false
      }
    }
  }

  /// Resolves with the order's decided status, or fails with `Timeout` once `window` elapses.
  ///
  /// A decision already on record when the wait starts resolves immediately.
  #[instrument(name = "NotificationChannelClient::await_decision", skip(self, cancel), err(Display))]
  pub async fn await_decision(
    &self,
    order_id: &str,
    strategy: DecisionStrategy,
    window: Duration,
    cancel: &CancellationToken,
  ) -> RanmixResult<OrderStatus> {
    let wait = async {
      match strategy {
        DecisionStrategy::Push => self.follow_feed(order_id).await,
        DecisionStrategy::Poll { interval } => self.poll_record(order_id, interval).await,
      }
    };

    tokio::select! {
      _ = cancel.cancelled() => Err(RanmixError::Cancelled),
      outcome = tokio::time::timeout(window, wait) => match outcome {
        Ok(decided) => decided,
        Err(_) => Err(RanmixError::Timeout {
          waiting_for: format!("a decision on order '{}'", order_id),
          waited: window,
        }),
      },
    }
  }

  async fn decided_status(&self, order_id: &str) -> RanmixResult<Option<OrderStatus>> {
    let order = self
      .orders
      .get(order_id)
      .await?
      .ok_or_else(|| RanmixError::NotFound(format!("order '{}'", order_id)))?;
    Ok(order.status.is_decided().then_some(order.status))
  }

  async fn follow_feed(&self, order_id: &str) -> RanmixResult<OrderStatus> {
    // Subscribe before reading so a decision landing in between is not missed.
    let mut changes = self.orders.subscribe();
    if let Some(status) = self.decided_status(order_id).await? {
      return Ok(status);
    }
    loop {
      match changes.recv().await {
        Ok(order) if order.id == order_id && order.status.is_decided() => return Ok(order.status),
        Ok(_) => continue,
        Err(RecvError::Lagged(skipped)) => {
          event!(Level::WARN, skipped, "Order change feed lagged; re-reading the record.");
          if let Some(status) = self.decided_status(order_id).await? {
            return Ok(status);
          }
        }
        Err(RecvError::Closed) => {
          return Err(RanmixError::transport("order change feed", "feed closed"));
        }
      }
    }
  }

  async fn poll_record(&self, order_id: &str, interval: Duration) -> RanmixResult<OrderStatus> {
    loop {
      match self.decided_status(order_id).await {
        Ok(Some(status)) => return Ok(status),
        Ok(None) => {}
        Err(e) if e.is_retryable() => {
          event!(Level::WARN, error = %e, "Order record read failed; will retry.");
        }
        Err(e) => return Err(e),
      }
      tokio::time::sleep(interval).await;
    }
  }
}

/// Builds the approver-facing notice: every order field plus the two decision actions.
pub fn payment_message(order: &Order, image: Option<EvidenceImage>) -> OutboundMessage {
  let text = format!(
    "🎵 RAN MIXOLOGY - Payment verification request\n\n\
     👤 Customer: {}\n\
     📧 Email: {}\n\
     📱 Phone: {}\n\
     💰 Amount: {}\n\
     💳 Method: {}\n\
     🧾 Order: {}\n\
     ⏰ Submitted: {}\n\n\
     Please confirm this payment so the customer can create their AI track.",
    order.customer_name,
    order.email,
    order.phone,
    format_price(order.amount),
    order.payment_method,
    order.id,
    order.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
  );

  let millis = order.created_at.timestamp_millis();
  let actions = vec![
    MessageAction {
      label: "✅ Confirm payment".to_string(),
      token: DecisionToken::new(Decision::Approve, millis, order.customer_name.clone()).to_string(),
    },
    MessageAction {
      label: "❌ Reject payment".to_string(),
      token: DecisionToken::new(Decision::Reject, millis, order.customer_name.clone()).to_string(),
    },
  ];

  OutboundMessage { text, image, actions }
}
