// ranmix/src/events/feed.rs

//! Sources of external bookings and the background ticker that applies them.

use super::catalog::EventCatalogStore;
use super::model::Event;
use crate::error::{RanmixError, RanmixResult};
use crate::task::TaskHandle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{event, Level};

/// Reports seats taken outside this process since the last tick.
pub trait OccupancySource: Send {
  fn external_bookings(&mut self, event: &Event) -> u32;
}

/// No bookings happen elsewhere; ticks only run the deadline sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExternalBookings;

impl OccupancySource for NoExternalBookings {
  fn external_bookings(&mut self, _event: &Event) -> u32 {
    0
  }
}

/// Randomized stand-in for real booking contention, for demos and tests.
#[derive(Debug, Clone)]
pub struct SimulatedOccupancy {
  rng: StdRng,
  chance: f64,
  max_per_tick: u32,
}

impl SimulatedOccupancy {
  /// 30% chance per event per tick of losing 0 to 2 seats.
  pub fn seeded(seed: u64) -> Self {
    Self {
      rng: StdRng::seed_from_u64(seed),
      chance: 0.3,
      max_per_tick: 2,
    }
  }
}

impl OccupancySource for SimulatedOccupancy {
  fn external_bookings(&mut self, _event: &Event) -> u32 {
    if self.rng.gen_bool(self.chance) {
      self.rng.gen_range(0..=self.max_per_tick)
    } else {
      0
    }
  }
}

/// Ticks `catalog` every `period` until the returned handle is cancelled.
///
/// A zero period is refused with `Config` and nothing is spawned.
pub fn spawn_occupancy_feed(
  catalog: Arc<EventCatalogStore>,
  mut source: Box<dyn OccupancySource>,
  period: Duration,
) -> RanmixResult<TaskHandle> {
  if period.is_zero() {
    return Err(RanmixError::Config("occupancy feed period must be greater than zero".into()));
  }
  Ok(TaskHandle::spawn("occupancy-feed", move |token| async move {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    event!(Level::INFO, period_secs = period.as_secs(), "Occupancy feed started.");
    loop {
      tokio::select! {
        _ = token.cancelled() => break,
        _ = ticker.tick() => {
          catalog.tick(source.as_mut());
        }
      }
    }
    event!(Level::INFO, "Occupancy feed stopped.");
  }))
}
