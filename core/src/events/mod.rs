// ranmix/src/events/mod.rs

//! The event catalog: time-boxed offerings with seat accounting and a periodic occupancy feed.

pub mod catalog;
pub mod feed;
pub mod model;
pub mod seed;

pub use catalog::{CatalogStats, EventCatalogStore, TickReport};
pub use feed::{spawn_occupancy_feed, NoExternalBookings, OccupancySource, SimulatedOccupancy};
pub use model::{
  Attendee, AvailabilityStatus, Event, EventKind, EventPatch, EventRegistration, NewEvent, RegistrationStatus,
};
pub use seed::seed_catalog;
