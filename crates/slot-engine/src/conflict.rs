//! Detect overlaps between a proposed time range and existing bookings.
//!
//! All ranges are half-open `[start, end)`. A booking that ends exactly when
//! another starts is NOT a conflict.

use chrono::{DateTime, Utc};

use crate::booking::{BookedRange, BookingRecord, ExistingBooking};

/// Whether `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn ranges_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether `[start, end)` overlaps any of `ranges`.
pub fn has_conflict(start: DateTime<Utc>, end: DateTime<Utc>, ranges: &[BookedRange]) -> bool {
    ranges
        .iter()
        .any(|r| ranges_overlap(start, end, r.start, r.end))
}

/// An existing booking that overlaps a proposed range.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConflict {
    pub booking_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub overlap_minutes: i64,
}

/// Find every non-cancelled record that overlaps `[start, end)`.
///
/// `exclude_id` skips one booking, so that moving an existing appointment does
/// not collide with its own current slot. Records with malformed timestamps are
/// ignored.
pub fn find_conflicts(
    records: &[BookingRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> Vec<BookingConflict> {
    records
        .iter()
        .filter(|r| r.status.occupies_time())
        .filter(|r| exclude_id != Some(r.id.as_str()))
        .filter_map(|r| {
            let range = ExistingBooking::from(r).range()?;
            if !ranges_overlap(start, end, range.start, range.end) {
                return None;
            }
            let overlap_start = start.max(range.start);
            let overlap_end = end.min(range.end);
            Some(BookingConflict {
                booking_id: r.id.clone(),
                start: range.start,
                end: range.end,
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            })
        })
        .collect()
}

/// Whether a proposed booking `[start, end)` collides with any existing one.
pub fn check_booking_conflict(
    records: &[BookingRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> bool {
    !find_conflicts(records, start, end, exclude_id).is_empty()
}
