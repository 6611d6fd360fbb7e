// ranmix/src/events/catalog.rs

//! `EventCatalogStore`: the in-memory catalog and its registration ledger.

use super::feed::OccupancySource;
use super::model::{Attendee, AvailabilityStatus, Event, EventPatch, EventRegistration, NewEvent, RegistrationStatus};
use super::seed::seed_catalog;
use crate::clock::Clock;
use crate::error::{RanmixError, RanmixResult};
use crate::store::{Observable, Subscription};
use serde::Serialize;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, Default)]
struct CatalogState {
  events: Vec<Event>,
  registrations: Vec<EventRegistration>,
}

impl CatalogState {
  fn active(&self) -> impl Iterator<Item = &Event> {
    self.events.iter().filter(|e| e.is_active)
  }

  fn active_events(&self) -> Vec<Event> {
    self.active().cloned().collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
  pub total_events: usize,
  pub total_seats: u64,
  pub available_seats: u64,
  /// Booked share of all active seats, rounded to a whole percent.
  pub occupancy_rate: u32,
  pub featured_events: usize,
  pub upcoming_events: usize,
}

/// What a single occupancy tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
  /// `(event id, seats taken)` for every event that lost seats.
  pub booked: Vec<(u32, u32)>,
  pub closed: Vec<u32>,
}

/// Holds every event ever seeded or added. Inactive events are kept but never returned by queries.
pub struct EventCatalogStore {
  state: Observable<CatalogState>,
  clock: Arc<dyn Clock>,
}

const DEFAULT_UPCOMING_LIMIT: usize = 5;

impl EventCatalogStore {
  pub fn new(events: Vec<Event>, clock: Arc<dyn Clock>) -> Self {
    let mut events = events;
    events.iter_mut().for_each(Event::refresh_status);
    Self {
      state: Observable::new(CatalogState {
        events,
        registrations: Vec::new(),
      }),
      clock,
    }
  }

  /// A catalog holding the launch events, dated relative to the clock's today.
  pub fn seeded(clock: Arc<dyn Clock>) -> Self {
    let events = seed_catalog(clock.today(), clock.now());
    Self::new(events, clock)
  }

  pub fn list(&self) -> Vec<Event> {
    self.state.read(CatalogState::active_events)
  }

  pub fn list_by_branch(&self, branch_id: &str) -> Vec<Event> {
    self.state.read(|s| s.active().filter(|e| e.branch == branch_id).cloned().collect())
  }

  pub fn list_featured(&self) -> Vec<Event> {
    self.state.read(|s| s.active().filter(|e| e.featured).cloned().collect())
  }

  /// Active events dated today or later, soonest first.
  pub fn list_upcoming(&self, limit: usize) -> Vec<Event> {
    let today = self.clock.today();
    self.state.read(|s| {
      let mut upcoming: Vec<Event> = s.active().filter(|e| e.date >= today).cloned().collect();
      upcoming.sort_by_key(|e| e.date);
      upcoming.truncate(limit);
      upcoming
    })
  }

  /// Case-insensitive substring match over title, description and location.
  pub fn search(&self, query: &str) -> Vec<Event> {
    let needle = query.to_lowercase();
    self.state.read(|s| s.active().filter(|e| e.matches_query(&needle)).cloned().collect())
  }

  /// Looks up any event, active or not.
  pub fn get(&self, event_id: u32) -> Option<Event> {
    self.state.read(|s| s.events.iter().find(|e| e.id == event_id).cloned())
  }

  pub fn registrations(&self) -> Vec<EventRegistration> {
    self.state.read(|s| s.registrations.clone())
  }

  /// Takes one seat for `attendee`.
  ///
  /// Fails without touching the catalog when the attendee is incomplete (`Validation`), the event
  /// is unknown (`NotFound`), or it is closed or sold out (`Capacity`).
  #[instrument(skip(self, attendee), fields(attendee = %attendee.name))]
  pub fn register(&self, event_id: u32, attendee: Attendee) -> RanmixResult<EventRegistration> {
    if attendee.name.trim().is_empty() {
      return Err(RanmixError::Validation("attendee name is required".into()));
    }
    if attendee.phone.trim().is_empty() && attendee.email.trim().is_empty() {
      return Err(RanmixError::Validation("a phone number or email is required".into()));
    }

    let now = self.clock.now();
    let outcome = self.state.update_if(|s| {
      let Some(ev) = s.events.iter_mut().find(|e| e.id == event_id) else {
        return (Err(RanmixError::NotFound(format!("event {}", event_id))), false);
      };
      if !ev.is_active {
        return (Err(capacity(event_id, "registration closed")), false);
      }
      if ev.available == 0 {
        return (Err(capacity(event_id, "sold out")), false);
      }
      ev.available -= 1;
      ev.refresh_status();
      ev.updated_at = now;

      let registration = EventRegistration {
        event_id,
        customer_name: attendee.name.trim().to_string(),
        customer_phone: attendee.phone.trim().to_string(),
        customer_email: attendee.email.trim().to_string(),
        registered_at: now,
        status: RegistrationStatus::Pending,
      };
      s.registrations.push(registration.clone());
      (Ok(registration), true)
    });

    match &outcome {
      Ok(_) => event!(Level::INFO, event_id, "Registration recorded."),
      Err(e) => event!(Level::INFO, event_id, error = %e, "Registration refused."),
    }
    outcome
  }

  /// Adds an event with id `max + 1`.
  pub fn add_event(&self, new_event: NewEvent) -> Event {
    let now = self.clock.now();
    self.state.update(|s| {
      let id = s.events.iter().map(|e| e.id).max().unwrap_or(0) + 1;
      let mut ev = Event {
        id,
        title: new_event.title,
        description: new_event.description,
        date: new_event.date,
        time_range: new_event.time_range,
        location: new_event.location,
        branch: new_event.branch,
        price: new_event.price,
        seats: new_event.seats,
        available: new_event.available,
        status: AvailabilityStatus::Open,
        kind: new_event.kind,
        highlights: new_event.highlights,
        featured: new_event.featured,
        offer: new_event.offer,
        rating: new_event.rating,
        registration_deadline: new_event.registration_deadline,
        is_active: true,
        created_at: now,
        updated_at: now,
      };
      ev.refresh_status();
      s.events.push(ev.clone());
      ev
    })
  }

  pub fn update_event(&self, event_id: u32, patch: EventPatch) -> RanmixResult<Event> {
    let now = self.clock.now();
    self.state.update_if(|s| match s.events.iter_mut().find(|e| e.id == event_id) {
      Some(ev) => {
        patch.apply(ev);
        if ev.is_active {
          ev.refresh_status();
        } else {
          ev.available = ev.available.min(ev.seats);
        }
        ev.updated_at = now;
        (Ok(ev.clone()), true)
      }
      None => (Err(RanmixError::NotFound(format!("event {}", event_id))), false),
    })
  }

  /// Soft delete: the event stays in storage but disappears from every query.
  pub fn deactivate_event(&self, event_id: u32) -> RanmixResult<()> {
    self.update_event(
      event_id,
      EventPatch {
        is_active: Some(false),
        ..EventPatch::default()
      },
    )
    .map(|_| ())
  }

  pub fn stats(&self) -> CatalogStats {
    let upcoming_events = self.list_upcoming(DEFAULT_UPCOMING_LIMIT).len();
    self.state.read(|s| {
      let total_seats: u64 = s.active().map(|e| u64::from(e.seats)).sum();
      let available_seats: u64 = s.active().map(|e| u64::from(e.available)).sum();
      let occupancy_rate = if total_seats > 0 {
        (((total_seats - available_seats) as f64 / total_seats as f64) * 100.0).round() as u32
      } else {
        0
      };
      CatalogStats {
        total_events: s.active().count(),
        total_seats,
        available_seats,
        occupancy_rate,
        featured_events: s.active().filter(|e| e.featured).count(),
        upcoming_events,
      }
    })
  }

  /// Applies external bookings from `source`, closes events whose deadline has passed, then
  /// notifies every subscriber.
  #[instrument(name = "EventCatalogStore::tick", skip_all)]
  pub fn tick(&self, source: &mut dyn OccupancySource) -> TickReport {
    let now = self.clock.now();
    let today = self.clock.today();
    let report = self.state.update(|s| {
      let mut report = TickReport::default();
      for ev in s.events.iter_mut().filter(|e| e.is_active) {
        if ev.available > 0 {
          let taken = source.external_bookings(ev).min(ev.available);
          if taken > 0 {
            ev.available -= taken;
            ev.refresh_status();
            ev.updated_at = now;
            report.booked.push((ev.id, taken));
          }
        }
        if ev.deadline_passed(today) {
          ev.is_active = false;
          ev.status = AvailabilityStatus::RegistrationClosed;
          ev.updated_at = now;
          report.closed.push(ev.id);
        }
      }
      report
    });
    event!(
      Level::DEBUG,
      booked = report.booked.len(),
      closed = report.closed.len(),
      "Occupancy tick applied."
    );
    report
  }

  /// The callback gets the active events right away and after every change.
  pub fn subscribe(&self, callback: impl Fn(&[Event]) + Send + Sync + 'static) -> Subscription {
    self.state.subscribe(move |s| callback(&s.active_events()))
  }

  /// Drops all subscribers.
  pub fn close(&self) {
    self.state.clear_subscribers();
  }
}

fn capacity(event_id: u32, reason: &str) -> RanmixError {
  RanmixError::Capacity {
    event_id,
    reason: reason.to_string(),
  }
}
