// apps/approval_webhook/src/repository/pg_orders.rs

//! Postgres-backed order records. Every write is announced with `pg_notify`, and a listener task
//! turns those notifications into the process-local change feed.

use crate::models::{NotificationRow, PaymentOrderRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ranmix::order::{Decision, DecisionOutcome, Notification, OrderChangeFeed, OrderRepository};
use ranmix::{Order, RanmixError, RanmixResult, TaskHandle};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

pub const ORDER_CHANGES_CHANNEL: &str = "payment_order_changes";

const ORDER_COLUMNS: &str =
  "id, customer_name, email, phone, amount, payment_method, status, created_at, updated_at";

fn db_error(e: sqlx::Error) -> RanmixError {
  RanmixError::Transport {
    service: "postgres",
    reason: e.to_string(),
  }
}

pub struct PgOrderRepository {
  pool: PgPool,
  changes: broadcast::Sender<Order>,
}

impl PgOrderRepository {
  pub fn new(pool: PgPool) -> Self {
    let (changes, _) = broadcast::channel(64);
    Self { pool, changes }
  }

  /// Announces a write to every listener, this process included. A failed announcement is only
  /// logged: the row is already committed and pollers will still see it.
  async fn announce(&self, order: &Order) {
    let payload = match serde_json::to_string(order) {
      Ok(p) => p,
      Err(e) => {
        warn!(order_id = %order.id, error = %e, "Could not serialize order change.");
        return;
      }
    };
    let sent = sqlx::query("SELECT pg_notify($1, $2)")
      .bind(ORDER_CHANGES_CHANNEL)
      .bind(payload)
      .execute(&self.pool)
      .await;
    if let Err(e) = sent {
      warn!(order_id = %order.id, error = %e, "pg_notify failed; change not announced.");
    }
  }

  /// Forwards `payment_order_changes` notifications into the change feed until cancelled.
  pub fn spawn_change_listener(&self) -> TaskHandle {
    let pool = self.pool.clone();
    let changes = self.changes.clone();
    TaskHandle::spawn("order-change-listener", move |token| async move {
      let mut listener = match PgListener::connect_with(&pool).await {
        Ok(l) => l,
        Err(e) => {
          error!(error = %e, "Could not open the order change listener.");
          return;
        }
      };
      if let Err(e) = listener.listen(ORDER_CHANGES_CHANNEL).await {
        error!(error = %e, "Could not LISTEN on {}.", ORDER_CHANGES_CHANNEL);
        return;
      }
      info!("Order change listener started.");

      loop {
        tokio::select! {
          _ = token.cancelled() => break,
          received = listener.recv() => match received {
            Ok(notification) => match serde_json::from_str::<Order>(notification.payload()) {
              // No receivers is fine; nobody is waiting on a decision right now.
              Ok(order) => { let _ = changes.send(order); }
              Err(e) => warn!(error = %e, "Ignoring malformed order change payload."),
            },
            Err(e) => {
              warn!(error = %e, "Order change listener lost its connection; retrying.");
              tokio::time::sleep(Duration::from_secs(1)).await;
            }
          }
        }
      }
      info!("Order change listener stopped.");
    })
  }

  async fn fetch(&self, order_id: &str) -> RanmixResult<Option<Order>> {
    let row = sqlx::query_as::<_, PaymentOrderRow>(&format!(
      "SELECT {} FROM payment_orders WHERE id = $1",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error)?;
    row.map(Order::try_from).transpose()
  }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
  #[instrument(skip(self, order), fields(order_id = %order.id), err(Display))]
  async fn insert(&self, order: Order) -> RanmixResult<()> {
    let amount = i64::try_from(order.amount)
      .map_err(|_| RanmixError::Validation(format!("amount {} is out of range", order.amount)))?;
    let inserted = sqlx::query(
      "INSERT INTO payment_orders \
       (id, customer_name, email, phone, amount, payment_method, status, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.email)
    .bind(&order.phone)
    .bind(amount)
    .bind(&order.payment_method)
    .bind(order.status.as_str())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await;

    match inserted {
      Ok(_) => {
        self.announce(&order).await;
        Ok(())
      }
      Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
        Err(RanmixError::Validation(format!("order '{}' already exists", order.id)))
      }
      Err(e) => Err(db_error(e)),
    }
  }

  async fn get(&self, order_id: &str) -> RanmixResult<Option<Order>> {
    self.fetch(order_id).await
  }

  async fn pending_for_customer(&self, customer: &str) -> RanmixResult<Option<Order>> {
    let row = sqlx::query_as::<_, PaymentOrderRow>(&format!(
      "SELECT {} FROM payment_orders WHERE customer_name = $1 AND status = 'pending' \
       ORDER BY created_at DESC LIMIT 1",
      ORDER_COLUMNS
    ))
    .bind(customer)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error)?;
    row.map(Order::try_from).transpose()
  }

  /// The `status = 'pending'` guard makes the transition a single compare-and-set, so two
  /// concurrent button presses cannot both apply.
  #[instrument(skip(self), err(Display))]
  async fn record_decision(
    &self,
    order_id: &str,
    decision: Decision,
    at: DateTime<Utc>,
  ) -> RanmixResult<DecisionOutcome> {
    let updated = sqlx::query_as::<_, PaymentOrderRow>(&format!(
      "UPDATE payment_orders SET status = $2, updated_at = $3 \
       WHERE id = $1 AND status = 'pending' RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(decision.resulting_status().as_str())
    .bind(at)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error)?;

    match updated {
      Some(row) => {
        let order = Order::try_from(row)?;
        self.announce(&order).await;
        Ok(DecisionOutcome::Applied(order))
      }
      None => match self.fetch(order_id).await? {
        Some(order) => Ok(DecisionOutcome::AlreadyDecided(order)),
        None => Err(RanmixError::NotFound(format!("order '{}'", order_id))),
      },
    }
  }

  async fn append_notification(&self, notification: Notification) -> RanmixResult<()> {
    sqlx::query(
      "INSERT INTO payment_notifications (order_id, customer_name, status, message, created_at) \
       VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&notification.order_id)
    .bind(&notification.customer_name)
    .bind(notification.status.as_str())
    .bind(&notification.message)
    .bind(notification.created_at)
    .execute(&self.pool)
    .await
    .map_err(db_error)?;
    Ok(())
  }

  async fn notifications_for(&self, order_id: &str) -> RanmixResult<Vec<Notification>> {
    let rows = sqlx::query_as::<_, NotificationRow>(
      "SELECT order_id, customer_name, status, message, created_at FROM payment_notifications \
       WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_error)?;
    rows.into_iter().map(Notification::try_from).collect()
  }
}

impl OrderChangeFeed for PgOrderRepository {
  fn subscribe(&self) -> broadcast::Receiver<Order> {
    self.changes.subscribe()
  }
}
