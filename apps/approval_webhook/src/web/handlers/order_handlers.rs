// apps/approval_webhook/src/web/handlers/order_handlers.rs

//! REST surface over the order records. Site sessions use it to create orders and read back the
//! approver's decision; the bot callback path writes decisions through the same repository.

use actix_web::{web, HttpResponse};
use ranmix::order::{DecisionReply, DecisionRequest, Notification, OrderRecord, OrderRepository};
use ranmix::{Order, OrderStatus, RanmixError};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
  pub customer: String,
  #[serde(default)]
  pub status: Option<String>,
}

#[instrument(name = "handler::create_order", skip(app_state, order), fields(order_id = %order.id))]
pub async fn create_order_handler(app_state: web::Data<AppState>, order: web::Json<Order>) -> AppResult<HttpResponse> {
  let order = order.into_inner();
  app_state.orders.insert(order.clone()).await?;
  info!(customer = %order.customer_name, amount = order.amount, "Order created.");
  Ok(HttpResponse::Created().json(order))
}

/// Only the pending lookup is served: the newest pending order of the customer, as a list of
/// zero or one.
#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrderQuery>,
) -> AppResult<HttpResponse> {
  let query = query.into_inner();
  if let Some(status) = query.status.as_deref() {
    if status.parse::<OrderStatus>().map_err(RanmixError::Validation)? != OrderStatus::Pending {
      return Err(RanmixError::Validation(format!("cannot list '{}' orders", status)).into());
    }
  }
  let pending: Vec<Order> = app_state
    .orders
    .pending_for_customer(&query.customer)
    .await?
    .into_iter()
    .collect();
  Ok(HttpResponse::Ok().json(pending))
}

#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(app_state: web::Data<AppState>, order_id: web::Path<String>) -> AppResult<HttpResponse> {
  let order_id = order_id.into_inner();
  let order = app_state
    .orders
    .get(&order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("order '{}'", order_id)))?;
  let notifications = app_state.orders.notifications_for(&order_id).await?;
  Ok(HttpResponse::Ok().json(OrderRecord { order, notifications }))
}

#[instrument(name = "handler::record_decision", skip(app_state, request))]
pub async fn record_decision_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  request: web::Json<DecisionRequest>,
) -> AppResult<HttpResponse> {
  let DecisionRequest { decision, at } = request.into_inner();
  let outcome = app_state.orders.record_decision(&order_id, decision, at).await?;
  let reply = DecisionReply::from(outcome);
  info!(applied = reply.applied, status = %reply.order.status, "Decision recorded over the API.");
  Ok(HttpResponse::Ok().json(reply))
}

#[instrument(name = "handler::append_notification", skip(app_state, notification))]
pub async fn append_notification_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  notification: web::Json<Notification>,
) -> AppResult<HttpResponse> {
  let notification = notification.into_inner();
  if notification.order_id != *order_id {
    return Err(
      RanmixError::Validation(format!(
        "notification for '{}' posted under '{}'",
        notification.order_id, order_id
      ))
      .into(),
    );
  }
  app_state.orders.append_notification(notification.clone()).await?;
  Ok(HttpResponse::Created().json(notification))
}
