// apps/approval_webhook/src/models/payment_order.rs

use chrono::{DateTime, Utc};
use ranmix::order::Notification;
use ranmix::{Order, OrderStatus, RanmixError};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PaymentOrderRow {
  pub id: String,
  pub customer_name: String,
  pub email: String,
  pub phone: String,
  pub amount: i64,
  pub payment_method: String,
  pub status: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
  pub order_id: String,
  pub customer_name: String,
  pub status: String,
  pub message: String,
  pub created_at: DateTime<Utc>,
}

fn parse_status(row_id: &str, raw: &str) -> Result<OrderStatus, RanmixError> {
  raw
    .parse::<OrderStatus>()
    .map_err(|e| RanmixError::Validation(format!("stored row '{}': {}", row_id, e)))
}

impl TryFrom<PaymentOrderRow> for Order {
  type Error = RanmixError;

  fn try_from(row: PaymentOrderRow) -> Result<Self, Self::Error> {
    let status = parse_status(&row.id, &row.status)?;
    let amount = u64::try_from(row.amount)
      .map_err(|_| RanmixError::Validation(format!("stored row '{}': negative amount", row.id)))?;
    Ok(Order {
      id: row.id,
      customer_name: row.customer_name,
      email: row.email,
      phone: row.phone,
      amount,
      payment_method: row.payment_method,
      status,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

impl TryFrom<NotificationRow> for Notification {
  type Error = RanmixError;

  fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
    Ok(Notification {
      status: parse_status(&row.order_id, &row.status)?,
      order_id: row.order_id,
      customer_name: row.customer_name,
      message: row.message,
      created_at: row.created_at,
    })
  }
}
