//! # slot-engine
//!
//! Deterministic booking-slot generation for appointment-based service
//! providers (barbers, tattoo artists, ...).
//!
//! Given a provider's weekly working hours, slot grid, turnover buffer and
//! notice rules, plus the bookings already placed on a day, the engine computes
//! every start time a client may still book. It is pure: no I/O, no global
//! clock, no timezone database. All instants are naive UTC and the provider's
//! timezone is a display label only.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use slot_engine::{generate_slots, ProviderSettings};
//!
//! let settings = ProviderSettings::default();
//! let monday = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
//! let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
//!
//! let slots = generate_slots(monday, 60, &settings, &[], now);
//! assert_eq!(slots.first().unwrap().local, "09:00");
//! assert_eq!(slots.last().unwrap().local, "17:00");
//! ```
//!
//! ## Modules
//!
//! - [`schedule`] — Working hours, provider settings and their defaults
//! - [`booking`] — Booking records, statuses and validated ranges
//! - [`conflict`] — Half-open overlap checks against existing bookings
//! - [`generator`] — Slot generation for a single day
//! - [`request`] — Input validation and the availability response payload
//! - [`error`] — Error types

pub mod booking;
pub mod conflict;
pub mod error;
pub mod generator;
pub mod request;
pub mod schedule;

pub use booking::{BookingRecord, BookingStatus, ExistingBooking};
pub use conflict::{check_booking_conflict, find_conflicts};
pub use error::SlotError;
pub use generator::{day_availability, generate_slots, AvailableSlot, DayAvailability};
pub use request::{resolve_availability, AvailabilityQuery, AvailabilityResponse};
pub use schedule::{DaySchedule, ProviderSettings, WorkingHours};
