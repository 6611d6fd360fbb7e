// tests/channel_client_tests.rs
mod common;

use chrono::Duration as ChronoDuration;
use common::*;
use ranmix::channel::{
  apply_decision, AppliedDecision, DecisionStrategy, DecisionToken, InMemoryChannel, NotificationChannelClient,
  UnmatchedDecisionPolicy,
};
use ranmix::order::{order_id, Decision, MemoryOrderRepository, Order, OrderRepository, OrderStatus};
use ranmix::RanmixError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn pending_order(customer: &str) -> Order {
  let now = fixed_now();
  Order {
    id: order_id(now.timestamp_millis(), customer),
    customer_name: customer.to_string(),
    email: "minh@example.com".to_string(),
    phone: "0901234567".to_string(),
    amount: 125_000,
    payment_method: "bank transfer".to_string(),
    status: OrderStatus::Pending,
    created_at: now,
    updated_at: now,
  }
}

fn client() -> (NotificationChannelClient, Arc<InMemoryChannel>, Arc<MemoryOrderRepository>) {
  let channel = Arc::new(InMemoryChannel::new());
  let orders = Arc::new(MemoryOrderRepository::new());
  (NotificationChannelClient::new(channel.clone(), orders.clone()), channel, orders)
}

#[tokio::test]
async fn notice_carries_every_field_and_both_actions() {
  setup_tracing();
  let (client, channel, _) = client();
  let order = pending_order("Minh");

  let receipt = client.notify(&order, Some(&receipt_image())).await;
  assert!(receipt.delivered);
  assert_eq!(receipt.order_id, order.id);

  let sent = channel.last_sent().unwrap();
  for expected in ["Minh", "minh@example.com", "0901234567", "125,000đ", "bank transfer", order.id.as_str()] {
    assert!(sent.text.contains(expected), "notice should mention {}", expected);
  }
  assert!(sent.image.is_some());
  assert_eq!(sent.actions.len(), 2);

  let approve: DecisionToken = sent.actions[0].token.parse().unwrap();
  let reject: DecisionToken = sent.actions[1].token.parse().unwrap();
  assert_eq!(approve.decision, Decision::Approve);
  assert_eq!(reject.decision, Decision::Reject);
  assert_eq!(approve.order_id(), order.id);
  assert_eq!(reject.order_id(), order.id);
}

#[tokio::test]
async fn failed_delivery_is_reported_not_raised() {
  let (client, channel, _) = client();
  channel.fail_next(1);
  let receipt = client.notify(&pending_order("Minh"), None).await;
  assert!(!receipt.delivered);
  assert!(receipt.failure.unwrap().contains("simulated network error"));
  assert!(channel.sent().is_empty());

  let retry = client.notify(&pending_order("Minh"), None).await;
  assert!(retry.delivered);
  assert_eq!(channel.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn push_wait_resolves_on_the_decision_write() {
  setup_tracing();
  let (client, _, orders) = client();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();

  let writer = orders.clone();
  let id = order.id.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_secs(10)).await;
    writer
      .record_decision(&id, Decision::Approve, fixed_now() + ChronoDuration::seconds(10))
      .await
      .unwrap();
  });

  let status = client
    .await_decision(
      &order.id,
      DecisionStrategy::Push,
      Duration::from_secs(300),
      &CancellationToken::new(),
    )
    .await
    .unwrap();
  assert_eq!(status, OrderStatus::Approved);
}

#[tokio::test(start_paused = true)]
async fn poll_wait_sees_a_rejection() {
  let (client, _, orders) = client();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();

  let writer = orders.clone();
  let id = order.id.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_secs(7)).await;
    writer.record_decision(&id, Decision::Reject, fixed_now()).await.unwrap();
  });

  let status = client
    .await_decision(
      &order.id,
      DecisionStrategy::Poll {
        interval: Duration::from_secs(3),
      },
      Duration::from_secs(300),
      &CancellationToken::new(),
    )
    .await
    .unwrap();
  assert_eq!(status, OrderStatus::Rejected);
}

#[tokio::test(start_paused = true)]
async fn decision_already_on_record_resolves_immediately() {
  let (client, _, orders) = client();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();
  orders.record_decision(&order.id, Decision::Approve, fixed_now()).await.unwrap();

  let started = tokio::time::Instant::now();
  let status = client
    .await_decision(&order.id, DecisionStrategy::Push, Duration::from_secs(300), &CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(status, OrderStatus::Approved);
  assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn silent_approver_times_out_and_order_stays_pending() {
  let (client, _, orders) = client();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();

  let started = tokio::time::Instant::now();
  let err = client
    .await_decision(&order.id, DecisionStrategy::Push, Duration::from_secs(300), &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, RanmixError::Timeout { .. }));
  assert!(err.is_retryable());
  assert!(started.elapsed() >= Duration::from_secs(300));
  assert!(orders.get(&order.id).await.unwrap().unwrap().is_pending());
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_stops_early() {
  let (client, _, orders) = client();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();

  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_secs(5)).await;
    trigger.cancel();
  });

  let err = client
    .await_decision(&order.id, DecisionStrategy::Push, Duration::from_secs(300), &cancel)
    .await
    .unwrap_err();
  assert!(matches!(err, RanmixError::Cancelled));
}

#[tokio::test]
async fn waiting_on_an_unknown_order_fails() {
  let (client, _, _) = client();
  let err = client
    .await_decision("order_0_nobody", DecisionStrategy::Push, Duration::from_secs(1), &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, RanmixError::NotFound(_)));
}

#[tokio::test]
async fn decision_is_applied_once_with_one_notification() {
  setup_tracing();
  let orders = MemoryOrderRepository::new();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();
  let token = DecisionToken::new(Decision::Approve, order.created_at.timestamp_millis(), "Minh");
  let later = fixed_now() + ChronoDuration::minutes(2);

  let first = apply_decision(&orders, &token, UnmatchedDecisionPolicy::Ignore, later).await.unwrap();
  let AppliedDecision::Applied(decided) = first else {
    panic!("expected the first decision to apply");
  };
  assert_eq!(decided.status, OrderStatus::Approved);
  assert_eq!(decided.updated_at, later);

  let reject = DecisionToken::new(Decision::Reject, order.created_at.timestamp_millis(), "Minh");
  let second = apply_decision(&orders, &reject, UnmatchedDecisionPolicy::Ignore, later).await.unwrap();
  assert!(matches!(&second, AppliedDecision::Duplicate(o) if o.status == OrderStatus::Approved));

  let notifications = orders.notifications_for(&order.id).await.unwrap();
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0].status, OrderStatus::Approved);
  assert!(notifications[0].message.starts_with("Payment confirmed!"));
}

#[tokio::test]
async fn token_with_a_stale_timestamp_falls_back_to_the_customers_pending_order() {
  let orders = MemoryOrderRepository::new();
  let order = pending_order("Minh");
  orders.insert(order.clone()).await.unwrap();

  let token = DecisionToken::new(Decision::Reject, 42, "Minh");
  let outcome = apply_decision(&orders, &token, UnmatchedDecisionPolicy::Ignore, fixed_now())
    .await
    .unwrap();
  assert!(matches!(&outcome, AppliedDecision::Applied(o) if o.id == order.id));
  assert_eq!(
    orders.get(&order.id).await.unwrap().unwrap().status,
    OrderStatus::Rejected
  );
}

#[tokio::test]
async fn unmatched_decision_follows_the_policy() {
  let orders = MemoryOrderRepository::new();
  let token = DecisionToken::new(Decision::Approve, 1_780_000_000_000, "Ghost");

  let ignored = apply_decision(&orders, &token, UnmatchedDecisionPolicy::Ignore, fixed_now())
    .await
    .unwrap();
  assert_eq!(ignored, AppliedDecision::Ignored);
  assert!(orders.all_orders().is_empty());

  let fallback = apply_decision(&orders, &token, UnmatchedDecisionPolicy::CreateFallbackRecord, fixed_now())
    .await
    .unwrap();
  let AppliedDecision::Fallback(record) = fallback else {
    panic!("expected a fallback record");
  };
  assert_eq!(record.id, token.order_id());
  assert_eq!(record.status, OrderStatus::Approved);
  assert_eq!(record.amount, 0);
  assert_eq!(orders.notifications_for(&record.id).await.unwrap().len(), 1);
}

#[test]
fn policy_parses_from_configuration_strings() {
  assert_eq!("fallback".parse::<UnmatchedDecisionPolicy>().unwrap(), UnmatchedDecisionPolicy::CreateFallbackRecord);
  assert_eq!(" Ignore ".parse::<UnmatchedDecisionPolicy>().unwrap(), UnmatchedDecisionPolicy::Ignore);
  assert!(matches!(
    "drop".parse::<UnmatchedDecisionPolicy>(),
    Err(RanmixError::Config(_))
  ));
}
