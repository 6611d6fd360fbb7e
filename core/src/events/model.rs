// ranmix/src/events/model.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
  Mixology,
  Music,
  Cultural,
  Workshop,
  Art,
}

/// The label shown next to an event, derived from seat availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "label", content = "remaining")]
pub enum AvailabilityStatus {
  SoldOut,
  FewSeatsLeft(u32),
  FillingUp,
  Open,
  RegistrationClosed,
}

impl AvailabilityStatus {
  /// 0 left: sold out; at most 20% left: few seats; at most 40%: filling up; otherwise open.
  pub fn derive(available: u32, capacity: u32) -> Self {
    if available == 0 {
      return AvailabilityStatus::SoldOut;
    }
    let (available, capacity) = (u64::from(available), u64::from(capacity));
    if available * 5 <= capacity {
      AvailabilityStatus::FewSeatsLeft(available as u32)
    } else if available * 5 <= capacity * 2 {
      AvailabilityStatus::FillingUp
    } else {
      AvailabilityStatus::Open
    }
  }
}

impl fmt::Display for AvailabilityStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AvailabilityStatus::SoldOut => write!(f, "sold out"),
      AvailabilityStatus::FewSeatsLeft(n) => write!(f, "few seats left ({})", n),
      AvailabilityStatus::FillingUp => write!(f, "filling up"),
      AvailabilityStatus::Open => write!(f, "open"),
      AvailabilityStatus::RegistrationClosed => write!(f, "registration closed"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub id: u32,
  pub title: String,
  pub description: String,
  pub date: NaiveDate,
  pub time_range: String,
  pub location: String,
  pub branch: String,
  /// Display price, e.g. `299,000đ`.
  pub price: String,
  pub seats: u32,
  pub available: u32,
  pub status: AvailabilityStatus,
  pub kind: EventKind,
  pub highlights: Vec<String>,
  pub featured: bool,
  pub offer: Option<String>,
  pub rating: f32,
  pub registration_deadline: Option<NaiveDate>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Event {
  pub(crate) fn refresh_status(&mut self) {
    self.available = self.available.min(self.seats);
    self.status = AvailabilityStatus::derive(self.available, self.seats);
  }

  pub fn deadline_passed(&self, today: NaiveDate) -> bool {
    self.registration_deadline.is_some_and(|deadline| today > deadline)
  }

  pub(crate) fn matches_query(&self, lowercase_query: &str) -> bool {
    self.title.to_lowercase().contains(lowercase_query)
      || self.description.to_lowercase().contains(lowercase_query)
      || self.location.to_lowercase().contains(lowercase_query)
  }
}

/// Input for `EventCatalogStore::add_event`; id, status and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub title: String,
  pub description: String,
  pub date: NaiveDate,
  pub time_range: String,
  pub location: String,
  pub branch: String,
  pub price: String,
  pub seats: u32,
  pub available: u32,
  pub kind: EventKind,
  pub highlights: Vec<String>,
  pub featured: bool,
  pub offer: Option<String>,
  pub rating: f32,
  pub registration_deadline: Option<NaiveDate>,
}

/// A partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub date: Option<NaiveDate>,
  pub time_range: Option<String>,
  pub location: Option<String>,
  pub branch: Option<String>,
  pub price: Option<String>,
  pub seats: Option<u32>,
  pub available: Option<u32>,
  pub featured: Option<bool>,
  pub offer: Option<Option<String>>,
  pub rating: Option<f32>,
  pub registration_deadline: Option<Option<NaiveDate>>,
  pub is_active: Option<bool>,
}

impl EventPatch {
  pub(crate) fn apply(self, event: &mut Event) {
    if let Some(v) = self.title {
      event.title = v;
    }
    if let Some(v) = self.description {
      event.description = v;
    }
    if let Some(v) = self.date {
      event.date = v;
    }
    if let Some(v) = self.time_range {
      event.time_range = v;
    }
    if let Some(v) = self.location {
      event.location = v;
    }
    if let Some(v) = self.branch {
      event.branch = v;
    }
    if let Some(v) = self.price {
      event.price = v;
    }
    if let Some(v) = self.seats {
      event.seats = v;
    }
    if let Some(v) = self.available {
      event.available = v;
    }
    if let Some(v) = self.featured {
      event.featured = v;
    }
    if let Some(v) = self.offer {
      event.offer = v;
    }
    if let Some(v) = self.rating {
      event.rating = v;
    }
    if let Some(v) = self.registration_deadline {
      event.registration_deadline = v;
    }
    if let Some(v) = self.is_active {
      event.is_active = v;
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
  pub name: String,
  pub phone: String,
  pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
  Pending,
  Confirmed,
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
  pub event_id: u32,
  pub customer_name: String,
  pub customer_phone: String,
  pub customer_email: String,
  pub registered_at: DateTime<Utc>,
  pub status: RegistrationStatus,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn availability_thresholds() {
    assert_eq!(AvailabilityStatus::derive(0, 20), AvailabilityStatus::SoldOut);
    assert_eq!(AvailabilityStatus::derive(4, 20), AvailabilityStatus::FewSeatsLeft(4));
    assert_eq!(AvailabilityStatus::derive(5, 20), AvailabilityStatus::FillingUp);
    assert_eq!(AvailabilityStatus::derive(8, 20), AvailabilityStatus::FillingUp);
    assert_eq!(AvailabilityStatus::derive(9, 20), AvailabilityStatus::Open);
    assert_eq!(AvailabilityStatus::FewSeatsLeft(3).to_string(), "few seats left (3)");
  }
}
