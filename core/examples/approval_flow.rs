// ranmix/examples/approval_flow.rs

//! Walks one customer through the whole flow with in-process collaborators: a cart, an event
//! registration, a payment notice approved from a second task, and a simulated AI track.

use ranmix::cart::Product;
use ranmix::channel::{apply_decision, DecisionToken, EvidenceImage, InMemoryChannel, UnmatchedDecisionPolicy};
use ranmix::events::{Attendee, SimulatedOccupancy};
use ranmix::generation::{PollProgress, SimulatedProvider};
use ranmix::order::MemoryOrderRepository;
use ranmix::store::MemoryStorage;
use ranmix::workflow::PaymentForm;
use ranmix::{
  format_price, AppContext, AppParts, DecisionStrategy, GenerationRequest, PollPolicy, RanmixConfig, RanmixError,
  SystemClock,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), RanmixError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Approval Flow Example ---");

  let channel = Arc::new(InMemoryChannel::new());
  let orders = Arc::new(MemoryOrderRepository::new());
  let mut config = RanmixConfig::default();
  config.workflow.approval_window = Duration::from_secs(10);
  config.event_tick = Duration::from_millis(200);

  let app = AppContext::assemble(AppParts {
    config,
    clock: Arc::new(SystemClock),
    storage: Arc::new(MemoryStorage::new()),
    channel: channel.clone(),
    provider: Arc::new(SimulatedProvider::new(3).with_asset_base("https://cdn.ranmixology.example")),
    poll_policy: PollPolicy {
      interval: Duration::from_millis(100),
      max_attempts: 20,
    },
    orders: orders.clone(),
    decision_strategy: DecisionStrategy::Push,
  });

  // 1. Cart
  app.cart.add_item(Product::new("Lychee Mojito", "mocktail", 45_000))?;
  app.cart.add_item(Product::new("Lychee Mojito", "mocktail", 45_000))?;
  app.cart.add_item(Product::new("Cold Brew", "coffee", 39_000))?;
  let cart = app.cart.state();
  info!(lines = cart.items.len(), items = cart.total_items, total = %format_price(cart.total_price), "Cart ready.");

  // 2. Events
  app.start_occupancy_feed(Box::new(SimulatedOccupancy::seeded(42)))?;
  let registration = app
    .register_for_event(
      2,
      Attendee {
        name: "Minh".to_string(),
        phone: "0901234567".to_string(),
        email: String::new(),
      },
    )
    .await?;
  info!(event_id = registration.event_id, "Registered for an event.");

  // 3. Approval-gated payment
  let mut session = app.start_session();
  let evidence = EvidenceImage::new("receipt.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])?;
  let order_id = session
    .submit(PaymentForm {
      customer_name: "Minh".to_string(),
      email: "minh@example.com".to_string(),
      phone: "0901234567".to_string(),
      amount: cart.total_price,
      payment_method: "bank transfer".to_string(),
      evidence: Some(evidence),
    })
    .await?;
  info!(%order_id, "Payment notice sent.");

  // The approver presses "confirm" a moment later.
  let approver_channel = channel.clone();
  let approver_orders = orders.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(500)).await;
    let Some(notice) = approver_channel.last_sent() else { return };
    let Ok(token) = notice.actions[0].token.parse::<DecisionToken>() else { return };
    let outcome = apply_decision(
      approver_orders.as_ref(),
      &token,
      UnmatchedDecisionPolicy::Ignore,
      chrono::Utc::now(),
    )
    .await;
    info!(?outcome, "Approver answered.");
  });

  let status = session.await_approval().await?;
  info!(%status, phase = %session.phase(), "Decision received.");

  // 4. Generation
  let job = session
    .request_generation(
      GenerationRequest::new("warm evening groove").inspired_by("Lychee Mojito", "chill"),
      |p: &PollProgress| info!(attempt = p.attempt, max = p.max_attempts, "Polling generation job."),
    )
    .await?;
  info!(job_id = %job.id, phase = %session.phase(), "Track ready.");

  if let Some(target) = session.download_target() {
    info!(url = %target.url, filename = %target.filename, "Download link.");
  }

  let stats = app.events.stats();
  info!(available = stats.available_seats, occupancy = stats.occupancy_rate, "Catalog after the run.");

  app.shutdown().await;
  info!("--- Approval Flow Example Finished ---");
  Ok(())
}
