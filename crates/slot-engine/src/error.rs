//! Error types for slot-engine request handling.
//!
//! Slot generation itself never fails: an empty slot list is the normal answer
//! for closed days, full days and exhausted windows. These errors cover the
//! request layer that parses caller input before the engine runs.

use thiserror::Error;

/// Errors raised while validating availability or booking requests.
#[derive(Error, Debug)]
pub enum SlotError {
    /// The target date was not a real `YYYY-MM-DD` calendar day.
    #[error("Invalid date format. Expected YYYY-MM-DD, got '{0}'")]
    InvalidDate(String),

    /// The requested service duration is outside the accepted range.
    #[error("Invalid duration {minutes}. Must be between {min} and {max} minutes")]
    InvalidDuration { minutes: i64, min: u32, max: u32 },

    /// A timestamp could not be parsed as RFC 3339 or naive ISO 8601.
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// Provider settings or booking JSON could not be deserialized.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The proposed booking overlaps `count` existing bookings.
    #[error("Requested time overlaps {count} existing booking(s)")]
    Conflict { count: usize },

    /// The proposed start is not one of the slots offered for that day
    /// (outside working hours, off the slot grid, too soon, or too far ahead).
    #[error("No bookable slot starts at {0}")]
    SlotUnavailable(String),
}

/// Convenience alias used throughout slot-engine.
pub type Result<T> = std::result::Result<T, SlotError>;
