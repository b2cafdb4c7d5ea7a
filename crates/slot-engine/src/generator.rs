//! Day-bound slot generation.
//!
//! Given one calendar day, a service duration, the provider's settings and the
//! bookings already placed that day, produce every start time a client may
//! still book. Candidates sit on a grid of `slot_interval` minutes anchored at
//! the day's opening time. Each candidate occupies `duration + buffer` minutes;
//! it is offered when that occupancy window fits inside working hours and
//! overlaps no existing booking. The customer-visible slot excludes the buffer.
//!
//! The current time is always a parameter. Nothing here reads a clock.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::{sanitize_bookings, BookedRange, ExistingBooking};
use crate::conflict::has_conflict;
use crate::schedule::ProviderSettings;

/// A bookable window offered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    /// Appointment start.
    pub start: DateTime<Utc>,
    /// Appointment end, excluding the provider's buffer.
    pub end: DateTime<Utc>,
    /// `"HH:MM"` label of `start` for display.
    pub local: String,
}

/// The configured opening hours of a day, echoed back for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingWindow {
    pub start: String,
    pub end: String,
}

/// Why a day produced no slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailability {
    /// The provider does not work this weekday, or its hours are unusable.
    Closed,
    /// The provider works this day but nothing fits anymore.
    FullyBooked,
    /// The date lies past the provider's booking horizon.
    BeyondHorizon,
}

/// Slots for one day together with the day's working window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub slots: Vec<AvailableSlot>,
    /// `None` when the provider is closed or the date is out of range.
    pub working_hours: Option<WorkingWindow>,
    /// Set whenever `slots` is empty.
    pub unavailable: Option<Unavailability>,
}

impl DayAvailability {
    fn empty(reason: Unavailability, working_hours: Option<WorkingWindow>) -> Self {
        Self {
            slots: Vec::new(),
            working_hours,
            unavailable: Some(reason),
        }
    }
}

/// Compute the bookable slots for `date`.
///
/// Returns an empty list for closed days, unusable working hours, a zero
/// duration or slot interval, dates beyond the booking horizon, and days where
/// nothing fits. None of these are errors.
///
/// # Arguments
///
/// * `date` — The calendar day, taken as UTC midnight.
/// * `service_duration_minutes` — Length of the requested appointment.
/// * `settings` — The provider's working hours and booking rules.
/// * `existing_bookings` — Bookings on that day. Cancelled and malformed
///   entries are ignored.
/// * `now` — The instant the request is evaluated at.
pub fn generate_slots(
    date: NaiveDate,
    service_duration_minutes: u32,
    settings: &ProviderSettings,
    existing_bookings: &[ExistingBooking],
    now: DateTime<Utc>,
) -> Vec<AvailableSlot> {
    day_availability(date, service_duration_minutes, settings, existing_bookings, now).slots
}

/// Like [`generate_slots`], but also reports the working window and, when no
/// slots remain, the reason.
///
/// Callers use this to tell "closed that day" apart from "fully booked": a
/// closed day has no working window, a full day does.
pub fn day_availability(
    date: NaiveDate,
    service_duration_minutes: u32,
    settings: &ProviderSettings,
    existing_bookings: &[ExistingBooking],
    now: DateTime<Utc>,
) -> DayAvailability {
    if settings.is_beyond_horizon(date, now) {
        tracing::debug!(%date, max_days = settings.max_advance_days, "date beyond booking horizon");
        return DayAvailability::empty(Unavailability::BeyondHorizon, None);
    }

    let Some(schedule) = settings.working_hours.for_date(date) else {
        tracing::debug!(%date, "no working hours configured");
        return DayAvailability::empty(Unavailability::Closed, None);
    };
    let Some((working_start, working_end)) = schedule.window_on(date) else {
        tracing::debug!(
            %date,
            enabled = schedule.enabled,
            start = %schedule.start,
            end = %schedule.end,
            "provider closed or working hours unusable"
        );
        return DayAvailability::empty(Unavailability::Closed, None);
    };
    let window = WorkingWindow {
        start: schedule.start.clone(),
        end: schedule.end.clone(),
    };

    let booked = sanitize_bookings(existing_bookings);
    let slots = fill_window(
        working_start,
        working_end,
        service_duration_minutes,
        settings,
        &booked,
        now,
    );

    if slots.is_empty() {
        DayAvailability::empty(Unavailability::FullyBooked, Some(window))
    } else {
        DayAvailability {
            slots,
            working_hours: Some(window),
            unavailable: None,
        }
    }
}

/// Walk the slot grid across one working window.
fn fill_window(
    working_start: DateTime<Utc>,
    working_end: DateTime<Utc>,
    service_duration_minutes: u32,
    settings: &ProviderSettings,
    booked: &[BookedRange],
    now: DateTime<Utc>,
) -> Vec<AvailableSlot> {
    if service_duration_minutes == 0 || settings.slot_interval == 0 {
        return Vec::new();
    }

    let interval = TimeDelta::minutes(i64::from(settings.slot_interval));
    let duration = TimeDelta::minutes(i64::from(service_duration_minutes));
    let occupancy = duration + TimeDelta::minutes(i64::from(settings.buffer_minutes));

    let min_booking = now
        .checked_add_signed(settings.min_advance())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let earliest = working_start.max(min_booking);
    if earliest >= working_end {
        return Vec::new();
    }
    let Some(mut candidate) = align_to_grid(earliest, working_start, interval) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    loop {
        let Some(occupancy_end) = candidate.checked_add_signed(occupancy) else {
            break;
        };
        if occupancy_end > working_end {
            break;
        }
        if !has_conflict(candidate, occupancy_end, booked) {
            slots.push(AvailableSlot {
                start: candidate,
                end: candidate + duration,
                local: candidate.format("%H:%M").to_string(),
            });
        }
        match candidate.checked_add_signed(interval) {
            Some(next) => candidate = next,
            None => break,
        }
    }

    tracing::trace!(count = slots.len(), "generated slots");
    slots
}

/// Round `instant` up to the next point `origin + k * interval`, `k >= 0`.
///
/// `instant` must not precede `origin`. Returns `None` on arithmetic overflow.
fn align_to_grid(
    instant: DateTime<Utc>,
    origin: DateTime<Utc>,
    interval: TimeDelta,
) -> Option<DateTime<Utc>> {
    let elapsed = (instant - origin).num_nanoseconds()?;
    let step = interval.num_nanoseconds()?;
    if elapsed % step == 0 {
        return Some(instant);
    }
    let steps = elapsed / step + 1;
    origin.checked_add_signed(TimeDelta::nanoseconds(step.checked_mul(steps)?))
}
