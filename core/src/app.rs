// ranmix/src/app.rs

//! `AppContext`: the composition root owning one instance of every store and client.

use crate::cart::CartStore;
use crate::channel::{
  DecisionStrategy, InMemoryChannel, NotificationChannel, NotificationChannelClient, QuickBooking, TelegramChannel,
};
use crate::clock::{Clock, SystemClock};
use crate::config::RanmixConfig;
use crate::error::RanmixResult;
use crate::events::{spawn_occupancy_feed, Attendee, EventCatalogStore, EventRegistration, OccupancySource};
use crate::generation::{GenerationClient, GenerationProvider, HttpGenerationProvider, PollPolicy, SimulatedProvider};
use crate::order::{HttpOrderRepository, MemoryOrderRepository, OrderBackend};
use crate::store::{FileStorage, MemoryStorage, StorageBackend};
use crate::task::TaskHandle;
use crate::workflow::{ApprovalGatedOrder, WorkflowDeps};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Explicit collaborators for [`AppContext::assemble`].
pub struct AppParts {
  pub config: RanmixConfig,
  pub clock: Arc<dyn Clock>,
  pub storage: Arc<dyn StorageBackend>,
  pub channel: Arc<dyn NotificationChannel>,
  pub provider: Arc<dyn GenerationProvider>,
  pub poll_policy: PollPolicy,
  pub orders: Arc<dyn OrderBackend>,
  pub decision_strategy: DecisionStrategy,
}

pub struct AppContext {
  pub config: RanmixConfig,
  pub clock: Arc<dyn Clock>,
  pub cart: Arc<CartStore>,
  pub events: Arc<EventCatalogStore>,
  pub orders: Arc<dyn OrderBackend>,
  pub workflow: Arc<WorkflowDeps>,
  occupancy_feed: Mutex<Option<TaskHandle>>,
}

impl AppContext {
  /// Wires real collaborators where configured and in-process stand-ins elsewhere.
  #[instrument(name = "AppContext::from_config", skip_all)]
  pub fn from_config(config: RanmixConfig) -> RanmixResult<Self> {
    let storage: Arc<dyn StorageBackend> = match &config.storage_dir {
      Some(dir) => Arc::new(FileStorage::open(dir)?),
      None => {
        event!(Level::WARN, "STORAGE_DIR not set; cart state will not survive restarts.");
        Arc::new(MemoryStorage::new())
      }
    };

    let channel: Arc<dyn NotificationChannel> = match &config.telegram {
      Some(telegram) => Arc::new(TelegramChannel::new(telegram)?),
      None => {
        event!(Level::WARN, "Telegram is not configured; payment notices stay in memory.");
        Arc::new(InMemoryChannel::new())
      }
    };

    let (provider, poll_policy): (Arc<dyn GenerationProvider>, PollPolicy) = match &config.generation {
      Some(generation) => (
        Arc::new(HttpGenerationProvider::new(generation)?),
        PollPolicy {
          interval: generation.poll_interval,
          max_attempts: generation.max_attempts,
        },
      ),
      None => {
        event!(Level::WARN, "Generation API is not configured; using the simulated provider.");
        (Arc::new(SimulatedProvider::default()), PollPolicy::default())
      }
    };

    // Decisions land on the approval server, which this process cannot follow; poll it.
    let (orders, decision_strategy): (Arc<dyn OrderBackend>, DecisionStrategy) = match &config.order_api {
      Some(api) => (
        Arc::new(HttpOrderRepository::new(api)?),
        DecisionStrategy::poll(&config.workflow),
      ),
      None => {
        event!(Level::WARN, "ORDER_API_BASE not set; orders stay in this process.");
        (Arc::new(MemoryOrderRepository::new()), DecisionStrategy::Push)
      }
    };

    Ok(Self::assemble(AppParts {
      config,
      clock: Arc::new(SystemClock),
      storage,
      channel,
      provider,
      poll_policy,
      orders,
      decision_strategy,
    }))
  }

  pub fn assemble(parts: AppParts) -> Self {
    let cart = Arc::new(CartStore::load(parts.storage));
    let events = Arc::new(EventCatalogStore::seeded(parts.clock.clone()));
    let channel = NotificationChannelClient::new(parts.channel, parts.orders.clone());
    let generation = GenerationClient::new(parts.provider, parts.poll_policy);
    let workflow = Arc::new(
      WorkflowDeps::new(channel, generation, parts.clock.clone(), parts.config.workflow.clone())
        .with_decision_strategy(parts.decision_strategy),
    );

    Self {
      config: parts.config,
      clock: parts.clock,
      cart,
      events,
      orders: parts.orders,
      workflow,
      occupancy_feed: Mutex::new(None),
    }
  }

  /// A fresh approval-gated session.
  pub fn start_session(&self) -> ApprovalGatedOrder {
    ApprovalGatedOrder::new(self.workflow.clone())
  }

  /// Takes a seat and tells the staff chat. An undelivered notice is logged; the seat is kept.
  #[instrument(name = "AppContext::register_for_event", skip(self, attendee))]
  pub async fn register_for_event(&self, event_id: u32, attendee: Attendee) -> RanmixResult<EventRegistration> {
    let registration = self.events.register(event_id, attendee)?;
    if let Some(event) = self.events.get(event_id) {
      self.workflow.channel.notify_registration(&event, &registration).await;
    }
    Ok(registration)
  }

  /// Forwards a table booking to the staff chat. `Ok(false)` means it was not delivered.
  pub async fn book_table(&self, booking: &QuickBooking) -> RanmixResult<bool> {
    self.workflow.channel.notify_quick_booking(booking, self.clock.now()).await
  }

  /// Starts ticking the event catalog, replacing any feed already running.
  pub fn start_occupancy_feed(&self, source: Box<dyn OccupancySource>) -> RanmixResult<()> {
    let handle = spawn_occupancy_feed(self.events.clone(), source, self.config.event_tick)?;
    if let Some(previous) = self.occupancy_feed.lock().replace(handle) {
      previous.cancel();
    }
    Ok(())
  }

  pub fn occupancy_feed_running(&self) -> bool {
    self.occupancy_feed.lock().as_ref().is_some_and(|h| !h.is_cancelled())
  }

  /// Stops background work and drops catalog subscribers.
  pub async fn shutdown(&self) {
    let feed = self.occupancy_feed.lock().take();
    if let Some(feed) = feed {
      feed.shutdown().await;
    }
    self.events.close();
    event!(Level::INFO, "Application context shut down.");
  }
}
