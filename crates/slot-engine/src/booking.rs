//! Booking records and their validated time ranges.
//!
//! Bookings arrive from storage as loosely-typed rows with string timestamps.
//! [`sanitize_bookings`] turns them into clean [`BookedRange`]s before any slot
//! arithmetic happens: cancelled bookings, unparseable timestamps and empty or
//! inverted ranges are dropped here, so the generation loop never has to look at
//! malformed data.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, SlotError};

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    /// A status this crate does not know, or none at all. Treated as
    /// occupying time.
    #[default]
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    /// Whether a booking in this state blocks its time range.
    pub fn occupies_time(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

/// A booking as handed to the engine for conflict checks.
///
/// Deserialization never fails on a single bad field: a missing or non-string
/// timestamp leaves a value that [`ExistingBooking::range`] rejects, and a
/// missing or unrecognized status reads as [`BookingStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingBooking {
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_time: String,
    /// Absent for rows whose end was never materialized; the end is then
    /// derived from `duration_snapshot`.
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub duration_snapshot: Option<u32>,
}

impl ExistingBooking {
    /// Convenience constructor for a booking with explicit start and end.
    pub fn new(start_time: &str, end_time: &str, status: BookingStatus) -> Self {
        Self {
            start_time: start_time.to_string(),
            end_time: Some(end_time.to_string()),
            status,
            duration_snapshot: None,
        }
    }

    /// The validated `[start, end)` range of this booking, or `None` when the
    /// timestamps are malformed or describe an empty range.
    ///
    /// Cancellation is not considered here; see [`sanitize_bookings`].
    pub fn range(&self) -> Option<BookedRange> {
        let start = parse_timestamp(&self.start_time).ok()?;
        let end = match (&self.end_time, self.duration_snapshot) {
            (Some(end), _) => parse_timestamp(end).ok()?,
            (None, Some(minutes)) => {
                start.checked_add_signed(TimeDelta::minutes(i64::from(minutes)))?
            }
            (None, None) => return None,
        };
        BookedRange::new(start, end)
    }
}

/// A persisted booking row, including the snapshot fields captured when the
/// booking was made.
///
/// Price, duration and service name are copied at booking time so that later
/// edits to the service catalogue do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub provider_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub service_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_time: String,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub deposit_paid: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub price_snapshot: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration_snapshot: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub service_name_snapshot: Option<String>,
}

impl From<&BookingRecord> for ExistingBooking {
    fn from(record: &BookingRecord) -> Self {
        Self {
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
            status: record.status,
            duration_snapshot: record.duration_snapshot,
        }
    }
}

// Field deserializers for stored rows. A value of the wrong JSON type degrades
// to something the range check drops instead of failing the whole array.

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?))
}

/// A validated, non-empty `[start, end)` interval occupied by a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookedRange {
    /// Build a range, rejecting empty and inverted intervals.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }
}

/// Keep only bookings that occupy time and have a valid range.
///
/// Dropped rows are logged at debug level and otherwise ignored; a bad row
/// never fails the computation.
pub fn sanitize_bookings(bookings: &[ExistingBooking]) -> Vec<BookedRange> {
    bookings
        .iter()
        .filter(|b| b.status.occupies_time())
        .filter_map(|b| {
            let range = b.range();
            if range.is_none() {
                tracing::debug!(
                    start = %b.start_time,
                    end = ?b.end_time,
                    "dropping booking with malformed time range"
                );
            }
            range
        })
        .collect()
}

/// Parse an ISO 8601 timestamp into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with any offset (`2026-03-16T10:00:00Z`,
/// `2026-03-16T10:00:00.000+00:00`) and naive datetimes
/// (`2026-03-16T10:00:00`), which are taken to be UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .map_err(|_| SlotError::InvalidTimestamp(s.to_string()))
}
