// ranmix/src/channel/staff.rs

//! Informational notices for the staff chat: event registrations and table bookings.
//! They carry no actions; staff follow up with the customer directly.

use super::message::OutboundMessage;
use crate::error::{RanmixError, RanmixResult};
use crate::events::{Event, EventRegistration};
use chrono::{DateTime, NaiveDate, Utc};

/// A table reservation made from the site without going through the event catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickBooking {
  pub name: String,
  pub phone: String,
  pub branch: String,
  pub date: NaiveDate,
  /// Free-form, e.g. `19:30`.
  pub time: String,
  pub guests: u32,
  pub notes: String,
}

impl QuickBooking {
  pub fn validate(&self) -> RanmixResult<()> {
    let missing = [
      ("name", &self.name),
      ("phone", &self.phone),
      ("branch", &self.branch),
      ("time", &self.time),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());
    if let Some((field, _)) = missing {
      return Err(RanmixError::Validation(format!("booking {} is required", field)));
    }
    if self.guests == 0 {
      return Err(RanmixError::Validation("a booking needs at least one guest".into()));
    }
    Ok(())
  }
}

fn or_dash(value: &str) -> &str {
  if value.trim().is_empty() {
    "-"
  } else {
    value
  }
}

pub fn registration_message(event: &Event, registration: &EventRegistration) -> OutboundMessage {
  let text = format!(
    "🎉 RAN MIXOLOGY - New event registration\n\n\
     🎯 Event: {} (#{})\n\
     📅 Date: {} {}\n\
     📍 Branch: {}\n\
     🎟️ Seats left: {}/{}\n\n\
     👤 Name: {}\n\
     📱 Phone: {}\n\
     📧 Email: {}\n\
     ⏰ Registered: {}",
    event.title,
    event.id,
    event.date,
    event.time_range,
    event.branch,
    event.available,
    event.seats,
    registration.customer_name,
    or_dash(&registration.customer_phone),
    or_dash(&registration.customer_email),
    registration.registered_at.format("%Y-%m-%d %H:%M:%S UTC"),
  );
  OutboundMessage {
    text,
    image: None,
    actions: Vec::new(),
  }
}

pub fn quick_booking_message(booking: &QuickBooking, at: DateTime<Utc>) -> OutboundMessage {
  let text = format!(
    "🍽️ RAN MIXOLOGY - New table booking\n\n\
     📍 Branch: {}\n\
     📅 Date: {}\n\
     🕐 Time: {}\n\
     👥 Guests: {}\n\
     📝 Notes: {}\n\n\
     👤 Name: {}\n\
     📱 Phone: {}\n\
     ⏰ Booked: {}\n\n\
     Please call the customer to confirm.",
    booking.branch,
    booking.date,
    booking.time,
    booking.guests,
    or_dash(&booking.notes),
    booking.name,
    booking.phone,
    at.format("%Y-%m-%d %H:%M:%S UTC"),
  );
  OutboundMessage {
    text,
    image: None,
    actions: Vec::new(),
  }
}
