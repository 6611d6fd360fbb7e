// ranmix/src/events/seed.rs

use super::model::{AvailabilityStatus, Event, EventKind};
use chrono::{DateTime, Days, NaiveDate, Utc};

const MAIN_BRANCH: &str = "nguyen-binh-khiem";

struct Seed {
  title: &'static str,
  description: &'static str,
  days_out: u64,
  deadline_days_out: u64,
  time_range: &'static str,
  venue: &'static str,
  price: &'static str,
  seats: u32,
  available: u32,
  kind: EventKind,
  highlights: [&'static str; 5],
  featured: bool,
  offer: &'static str,
  rating: f32,
}

const LAUNCH_EVENTS: [Seed; 5] = [
  Seed {
    title: "Mixology & Melody Workshop",
    description: "An alcohol-free acoustic DJ night paired with creative mocktails",
    days_out: 1,
    deadline_days_out: 0,
    time_range: "19:00 - 22:00",
    venue: "RAN Mixology",
    price: "299,000đ",
    seats: 20,
    available: 8,
    kind: EventKind::Mixology,
    highlights: [
      "Live mixology demo",
      "DJ acoustic set",
      "3 signature mocktails",
      "An exclusive AI track",
      "QR check-in token",
    ],
    featured: true,
    offer: "A free AI track worth 39,000đ",
    rating: 4.8,
  },
  Seed {
    title: "AI Music Night",
    description: "Create your own AI track over signature mocktails",
    days_out: 7,
    deadline_days_out: 5,
    time_range: "20:00 - 23:00",
    venue: "RAN Coffee - Tea",
    price: "199,000đ",
    seats: 30,
    available: 15,
    kind: EventKind::Music,
    highlights: [
      "Live AI music demo",
      "Professional DJ set",
      "Personalised playlist",
      "Track NFT",
      "Premium alcohol-free cocktails",
    ],
    featured: false,
    offer: "20% off for two",
    rating: 4.9,
  },
  Seed {
    title: "Tea Ceremony: The Art of Tea",
    description: "A traditional tea ceremony in a modern space, led by a tea master",
    days_out: 30,
    deadline_days_out: 27,
    time_range: "14:00 - 16:00",
    venue: "RAN Bitro",
    price: "249,000đ",
    seats: 12,
    available: 4,
    kind: EventKind::Cultural,
    highlights: [
      "Certified tea master",
      "4 premium teas",
      "Learn the art of brewing",
      "Mini tea set",
      "Completion certificate",
    ],
    featured: false,
    offer: "Take a tea set home",
    rating: 4.7,
  },
  Seed {
    title: "Coffee Journey: From Bean to Cup",
    description: "A workshop following coffee from the bean to the perfect cup",
    days_out: 3,
    deadline_days_out: 2,
    time_range: "10:00 - 12:00",
    venue: "RAN Coffee - Tea",
    price: "179,000đ",
    seats: 15,
    available: 7,
    kind: EventKind::Workshop,
    highlights: [
      "Professional barista",
      "5 premium coffees",
      "Brew it yourself",
      "In-depth know-how",
      "Sample beans to take home",
    ],
    featured: false,
    offer: "15% off for groups of 4",
    rating: 4.6,
  },
  Seed {
    title: "Art & Mix",
    description: "Painting meets creative drink mixing",
    days_out: 10,
    deadline_days_out: 7,
    time_range: "18:00 - 21:00",
    venue: "RAN Bitro",
    price: "359,000đ",
    seats: 25,
    available: 12,
    kind: EventKind::Art,
    highlights: [
      "Guided by a painter",
      "Premium art supplies",
      "Artful cocktails",
      "Take your work home",
      "Live music",
    ],
    featured: true,
    offer: "A premium frame for your piece",
    rating: 4.5,
  },
];

/// The five launch events, dated relative to `today`.
pub fn seed_catalog(today: NaiveDate, now: DateTime<Utc>) -> Vec<Event> {
  LAUNCH_EVENTS
    .iter()
    .zip(1u32..)
    .map(|(seed, id)| Event {
      id,
      title: seed.title.to_string(),
      description: seed.description.to_string(),
      date: today + Days::new(seed.days_out),
      time_range: seed.time_range.to_string(),
      location: format!("{} - 35 Nguyễn Bỉnh Khiêm", seed.venue),
      branch: MAIN_BRANCH.to_string(),
      price: seed.price.to_string(),
      seats: seed.seats,
      available: seed.available,
      status: AvailabilityStatus::derive(seed.available, seed.seats),
      kind: seed.kind,
      highlights: seed.highlights.iter().map(|h| h.to_string()).collect(),
      featured: seed.featured,
      offer: Some(seed.offer.to_string()),
      rating: seed.rating,
      registration_deadline: Some(today + Days::new(seed.deadline_days_out)),
      is_active: true,
      created_at: now,
      updated_at: now,
    })
    .collect()
}
