//! Request handling in front of the slot generator.
//!
//! This is the layer a web handler, the CLI or the WASM bindings call into. It
//! parses raw caller input, falls back to default provider settings, and shapes
//! the engine's output into the availability payload clients consume.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::{parse_timestamp, BookingRecord, ExistingBooking};
use crate::conflict::find_conflicts;
use crate::error::{Result, SlotError};
use crate::generator::{day_availability, AvailableSlot, Unavailability, WorkingWindow};
use crate::schedule::ProviderSettings;

/// Shortest service a client may request, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 15;
/// Longest service a client may request, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 480;
/// Duration assumed when the caller does not send a usable one.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// A validated availability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub duration_minutes: u32,
}

impl AvailabilityQuery {
    /// Validate raw query parameters.
    ///
    /// `date` must be a real calendar day written `YYYY-MM-DD`. The duration is
    /// read from its leading integer, so `"90min"` means 90. A missing,
    /// non-numeric or zero `duration` falls back to
    /// [`DEFAULT_DURATION_MINUTES`]; any other value outside
    /// [`MIN_DURATION_MINUTES`]..=[`MAX_DURATION_MINUTES`] is rejected.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidDate` or `SlotError::InvalidDuration`.
    pub fn parse(date: &str, duration: Option<&str>) -> Result<Self> {
        let date = parse_date(date)?;
        let minutes = duration
            .and_then(leading_integer)
            .filter(|m| *m != 0)
            .unwrap_or(i64::from(DEFAULT_DURATION_MINUTES));
        Ok(Self {
            date,
            duration_minutes: check_duration(minutes)?,
        })
    }
}

/// Parse a strict `YYYY-MM-DD` date.
///
/// # Errors
/// Returns `SlotError::InvalidDate` for any other shape or an impossible day.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    let invalid = || SlotError::InvalidDate(s.to_string());
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

/// The optionally signed run of digits at the start of `s`, ignoring leading
/// whitespace. Saturates instead of overflowing.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: Vec<i64> = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .map(|b| i64::from(b - b'0'))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits
        .into_iter()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d));
    Some(if negative { -magnitude } else { magnitude })
}

fn check_duration(minutes: i64) -> Result<u32> {
    u32::try_from(minutes)
        .ok()
        .filter(|m| (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(m))
        .ok_or(SlotError::InvalidDuration {
            minutes,
            min: MIN_DURATION_MINUTES,
            max: MAX_DURATION_MINUTES,
        })
}

/// The availability payload returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub slots: Vec<AvailableSlot>,
    /// `null` when the provider is closed or the date is out of range.
    pub working_hours: Option<WorkingWindow>,
    pub timezone: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Unavailability>,
}

/// Answer an availability query.
///
/// `settings` is `None` for providers that never stored their own; the
/// documented [`ProviderSettings::default`] applies then. Dates past the
/// provider's horizon get an empty list and an explanatory message.
pub fn resolve_availability(
    query: &AvailabilityQuery,
    settings: Option<&ProviderSettings>,
    bookings: &[ExistingBooking],
    now: DateTime<Utc>,
) -> AvailabilityResponse {
    let settings = settings.cloned().unwrap_or_default();
    let day = day_availability(query.date, query.duration_minutes, &settings, bookings, now);

    let message = match day.unavailable {
        Some(Unavailability::BeyondHorizon) => Some(format!(
            "Bookings can only be made up to {} days in advance",
            settings.max_advance_days
        )),
        _ => None,
    };

    AvailabilityResponse {
        slots: day.slots,
        working_hours: day.working_hours,
        timezone: settings.timezone,
        date: query.date.format("%Y-%m-%d").to_string(),
        message,
        reason: day.unavailable,
    }
}

/// A booking request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedBooking {
    pub start: DateTime<Utc>,
    /// End of the appointment, excluding buffer.
    pub end: DateTime<Utc>,
}

/// Validate a new booking (or a move of `exclude_id`) before it is stored.
///
/// The start must be one of the slots the engine would offer for that day, and
/// its occupancy window must not overlap any other live booking.
///
/// # Errors
/// - `SlotError::InvalidTimestamp` if `start_time` does not parse.
/// - `SlotError::InvalidDuration` if the duration is out of range.
/// - `SlotError::Conflict` if the occupancy window overlaps other bookings.
/// - `SlotError::SlotUnavailable` if the start is not an offered slot.
pub fn validate_booking_request(
    start_time: &str,
    duration_minutes: u32,
    settings: &ProviderSettings,
    records: &[BookingRecord],
    exclude_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ProposedBooking> {
    let start = parse_timestamp(start_time)?;
    let duration_minutes = check_duration(i64::from(duration_minutes))?;
    let shift = |from: DateTime<Utc>, minutes: u32| {
        from.checked_add_signed(TimeDelta::minutes(i64::from(minutes)))
            .ok_or_else(|| SlotError::InvalidTimestamp(start_time.to_string()))
    };
    let end = shift(start, duration_minutes)?;
    let occupancy_end = shift(end, settings.buffer_minutes)?;

    let conflicts = find_conflicts(records, start, occupancy_end, exclude_id);
    if !conflicts.is_empty() {
        tracing::info!(%start, count = conflicts.len(), "booking request conflicts");
        return Err(SlotError::Conflict {
            count: conflicts.len(),
        });
    }

    let others: Vec<ExistingBooking> = records
        .iter()
        .filter(|r| exclude_id != Some(r.id.as_str()))
        .map(ExistingBooking::from)
        .collect();
    let offered = day_availability(start.date_naive(), duration_minutes, settings, &others, now);
    if !offered.slots.iter().any(|slot| slot.start == start) {
        return Err(SlotError::SlotUnavailable(start.to_rfc3339()));
    }

    Ok(ProposedBooking { start, end })
}
