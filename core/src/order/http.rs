// ranmix/src/order/http.rs

//! Order records kept by the approval server and reached over its REST API.

use super::model::{Decision, DecisionOutcome, DecisionReply, DecisionRequest, Notification, Order, OrderRecord};
use super::repository::{OrderChangeFeed, OrderRepository};
use crate::config::OrderApiConfig;
use crate::error::{RanmixError, RanmixResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{event, instrument, Level};
use url::Url;

const SERVICE: &str = "order API";

/// Orders shared with the webhook server, so a decision made in the chat reaches the session
/// that submitted the order.
///
/// The change feed only carries writes made through this client. Decisions recorded by the
/// server are observed by polling the record.
pub struct HttpOrderRepository {
  http: reqwest::Client,
  base: Url,
  changes: broadcast::Sender<Order>,
}

impl HttpOrderRepository {
  pub fn new(config: &OrderApiConfig) -> RanmixResult<Self> {
    let base = Url::parse(config.api_base.trim_end_matches('/'))
      .map_err(|e| RanmixError::Config(format!("order API base '{}' is not a URL: {}", config.api_base, e)))?;
    if base.cannot_be_a_base() {
      return Err(RanmixError::Config(format!("order API base '{}' cannot carry a path", base)));
    }
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .map_err(|e| RanmixError::Config(format!("HTTP client error: {}", e)))?;
    let (changes, _) = broadcast::channel(64);
    Ok(Self { http, base, changes })
  }

  /// `base/<segments>`, each segment percent-encoded. Customer names may hold spaces.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn send(&self, request: reqwest::RequestBuilder) -> RanmixResult<reqwest::Response> {
    request.send().await.map_err(|e| RanmixError::transport(SERVICE, e))
  }

  async fn failure(response: reqwest::Response) -> RanmixError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
      RanmixError::Validation(format!("order API refused the request ({}): {}", status, body))
    } else {
      RanmixError::transport(SERVICE, format!("{} - {}", status, body))
    }
  }

  async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> RanmixResult<T> {
    response
      .json::<T>()
      .await
      .map_err(|e| RanmixError::transport(SERVICE, format!("unreadable response: {}", e)))
  }

  async fn fetch_record(&self, order_id: &str) -> RanmixResult<Option<OrderRecord>> {
    let response = self.send(self.http.get(self.endpoint(&["orders", order_id]))).await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    Self::read_json(response).await.map(Some)
  }

  fn publish(&self, order: Order) {
    let _ = self.changes.send(order);
  }
}

#[async_trait]
impl OrderRepository for HttpOrderRepository {
  #[instrument(name = "HttpOrderRepository::insert", skip_all, fields(order_id = %order.id))]
  async fn insert(&self, order: Order) -> RanmixResult<()> {
    let response = self
      .send(self.http.post(self.endpoint(&["orders"])).json(&order))
      .await?;
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    event!(Level::DEBUG, "Order stored by the order API.");
    self.publish(order);
    Ok(())
  }

  async fn get(&self, order_id: &str) -> RanmixResult<Option<Order>> {
    Ok(self.fetch_record(order_id).await?.map(|record| record.order))
  }

  async fn pending_for_customer(&self, customer: &str) -> RanmixResult<Option<Order>> {
    let request = self
      .http
      .get(self.endpoint(&["orders"]))
      .query(&[("customer", customer), ("status", "pending")]);
    let response = self.send(request).await?;
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    let orders: Vec<Order> = Self::read_json(response).await?;
    Ok(orders.into_iter().max_by_key(|o| o.created_at))
  }

  #[instrument(name = "HttpOrderRepository::record_decision", skip(self))]
  async fn record_decision(
    &self,
    order_id: &str,
    decision: Decision,
    at: DateTime<Utc>,
  ) -> RanmixResult<DecisionOutcome> {
    let body = DecisionRequest { decision, at };
    let response = self
      .send(self.http.post(self.endpoint(&["orders", order_id, "decision"])).json(&body))
      .await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Err(RanmixError::NotFound(format!("order '{}'", order_id)));
    }
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    let outcome = DecisionOutcome::from(Self::read_json::<DecisionReply>(response).await?);
    if let DecisionOutcome::Applied(order) = &outcome {
      self.publish(order.clone());
    }
    Ok(outcome)
  }

  async fn append_notification(&self, notification: Notification) -> RanmixResult<()> {
    let url = self.endpoint(&["orders", &notification.order_id, "notifications"]);
    let response = self.send(self.http.post(url).json(&notification)).await?;
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    Ok(())
  }

  async fn notifications_for(&self, order_id: &str) -> RanmixResult<Vec<Notification>> {
    Ok(
      self
        .fetch_record(order_id)
        .await?
        .map(|record| record.notifications)
        .unwrap_or_default(),
    )
  }
}

impl OrderChangeFeed for HttpOrderRepository {
  fn subscribe(&self) -> broadcast::Receiver<Order> {
    self.changes.subscribe()
  }
}
