// ranmix/src/order/repository.rs

use super::model::{Decision, DecisionOutcome, Notification, Order};
use crate::error::{RanmixError, RanmixResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{event, Level};

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Fails with `Validation` when the id is already taken.
  async fn insert(&self, order: Order) -> RanmixResult<()>;

  async fn get(&self, order_id: &str) -> RanmixResult<Option<Order>>;

  /// The most recently created pending order of `customer`, if any.
  async fn pending_for_customer(&self, customer: &str) -> RanmixResult<Option<Order>>;

  /// Moves a pending order to the decision's status. Deciding twice is a no-op that reports
  /// `AlreadyDecided`. Fails with `NotFound` for an unknown id.
  async fn record_decision(&self, order_id: &str, decision: Decision, at: DateTime<Utc>)
    -> RanmixResult<DecisionOutcome>;

  async fn append_notification(&self, notification: Notification) -> RanmixResult<()>;

  async fn notifications_for(&self, order_id: &str) -> RanmixResult<Vec<Notification>>;
}

/// Change-data-capture stream over order writes.
pub trait OrderChangeFeed: Send + Sync {
  /// Every order written after this call is delivered to the receiver.
  fn subscribe(&self) -> broadcast::Receiver<Order>;
}

/// A repository that also exposes its change feed.
pub trait OrderBackend: OrderRepository + OrderChangeFeed {}

impl<T: OrderRepository + OrderChangeFeed> OrderBackend for T {}

#[derive(Default)]
struct Records {
  orders: Vec<Order>,
  notifications: Vec<Notification>,
}

/// Process-local order records.
pub struct MemoryOrderRepository {
  records: Mutex<Records>,
  changes: broadcast::Sender<Order>,
}

impl MemoryOrderRepository {
  pub fn new() -> Self {
    let (changes, _) = broadcast::channel(64);
    Self {
      records: Mutex::new(Records::default()),
      changes,
    }
  }

  pub fn all_orders(&self) -> Vec<Order> {
    self.records.lock().orders.clone()
  }

  fn publish(&self, order: Order) {
    // No receivers is fine: nobody is waiting on this order right now.
    let _ = self.changes.send(order);
  }
}

impl Default for MemoryOrderRepository {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
  async fn insert(&self, order: Order) -> RanmixResult<()> {
    {
      let mut records = self.records.lock();
      if records.orders.iter().any(|o| o.id == order.id) {
        return Err(RanmixError::Validation(format!("order '{}' already exists", order.id)));
      }
      records.orders.push(order.clone());
    }
    event!(Level::DEBUG, order_id = %order.id, "Order inserted.");
    self.publish(order);
    Ok(())
  }

  async fn get(&self, order_id: &str) -> RanmixResult<Option<Order>> {
    Ok(self.records.lock().orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn pending_for_customer(&self, customer: &str) -> RanmixResult<Option<Order>> {
    Ok(
      self
        .records
        .lock()
        .orders
        .iter()
        .filter(|o| o.customer_name == customer && o.is_pending())
        .max_by_key(|o| o.created_at)
        .cloned(),
    )
  }

  async fn record_decision(
    &self,
    order_id: &str,
    decision: Decision,
    at: DateTime<Utc>,
  ) -> RanmixResult<DecisionOutcome> {
    let outcome = {
      let mut records = self.records.lock();
      let order = records
        .orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| RanmixError::NotFound(format!("order '{}'", order_id)))?;
      if order.is_pending() {
        order.status = decision.resulting_status();
        order.updated_at = at;
        DecisionOutcome::Applied(order.clone())
      } else {
        DecisionOutcome::AlreadyDecided(order.clone())
      }
    };
    if let DecisionOutcome::Applied(order) = &outcome {
      self.publish(order.clone());
    }
    Ok(outcome)
  }

  async fn append_notification(&self, notification: Notification) -> RanmixResult<()> {
    self.records.lock().notifications.push(notification);
    Ok(())
  }

  async fn notifications_for(&self, order_id: &str) -> RanmixResult<Vec<Notification>> {
    Ok(
      self
        .records
        .lock()
        .notifications
        .iter()
        .filter(|n| n.order_id == order_id)
        .cloned()
        .collect(),
    )
  }
}

impl OrderChangeFeed for MemoryOrderRepository {
  fn subscribe(&self) -> broadcast::Receiver<Order> {
    self.changes.subscribe()
  }
}
