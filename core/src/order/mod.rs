// ranmix/src/order/mod.rs

//! Durable order and notification records shared by the workflow and the webhook server.

pub mod http;
pub mod model;
pub mod repository;

pub use http::HttpOrderRepository;
pub use model::{
  order_id, Decision, DecisionOutcome, DecisionReply, DecisionRequest, Notification, Order, OrderRecord, OrderStatus,
};
pub use repository::{MemoryOrderRepository, OrderBackend, OrderChangeFeed, OrderRepository};
