//! Provider working-hours configuration.
//!
//! Working hours are stored as a JSON object keyed by weekday number
//! (`"0"` = Sunday .. `"6"` = Saturday). In memory they live in a fixed
//! seven-entry array indexed by [`Weekday::num_days_from_sunday`], so every
//! day is addressed by position rather than by string lookup.
//!
//! Times of day are `"H:MM"` / `"HH:MM"` labels in the provider's nominal local
//! frame. No timezone conversion happens anywhere in this crate: a working day
//! that opens at `09:00` opens at `09:00 UTC` on the target date, and the
//! configured `timezone` is carried through for display only.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Number of weekday entries in a [`WorkingHours`] table.
pub const DAYS_PER_WEEK: usize = 7;

/// Opening hours for a single weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Opening time label, e.g. `"09:00"`.
    pub start: String,
    /// Closing time label, e.g. `"18:00"`.
    pub end: String,
    /// Whether the provider accepts bookings on this weekday.
    pub enabled: bool,
}

impl DaySchedule {
    /// An enabled day between two `"HH:MM"` labels.
    pub fn open(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            enabled: true,
        }
    }

    /// A disabled day. The labels are kept at `00:00` to match stored rows.
    pub fn closed() -> Self {
        Self {
            start: "00:00".to_string(),
            end: "00:00".to_string(),
            enabled: false,
        }
    }

    /// Resolve this schedule to concrete instants on `date`.
    ///
    /// Returns `None` when the day is disabled, when either label fails to
    /// parse, or when the opening time is not strictly before the closing time.
    pub fn window_on(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if !self.enabled {
            return None;
        }
        let start = parse_time_of_day(&self.start)?;
        let end = parse_time_of_day(&self.end)?;
        if start >= end {
            return None;
        }
        Some((
            date.and_time(start).and_utc(),
            date.and_time(end).and_utc(),
        ))
    }
}

/// Parse an `"H:MM"` or `"HH:MM"` time-of-day label.
///
/// The hour must be one or two digits in `0..=23` and the minute exactly two
/// digits in `0..=59`. Anything else (seconds, `24:00`, whitespace) is rejected.
pub fn parse_time_of_day(label: &str) -> Option<NaiveTime> {
    let (hours, minutes) = label.split_once(':')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if hours.len() > 2 || minutes.len() != 2 || !all_digits(hours) || !all_digits(minutes) {
        return None;
    }
    let h: u32 = hours.parse().ok()?;
    let m: u32 = minutes.parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Weekly working-hours table, one optional entry per weekday.
///
/// A missing entry means the provider is closed that day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, DaySchedule>",
    into = "BTreeMap<String, DaySchedule>"
)]
pub struct WorkingHours {
    days: [Option<DaySchedule>; DAYS_PER_WEEK],
}

impl WorkingHours {
    /// Build a table from all seven entries, Sunday first.
    pub fn from_days(days: [Option<DaySchedule>; DAYS_PER_WEEK]) -> Self {
        Self { days }
    }

    /// The schedule configured for `weekday`, if any.
    pub fn get(&self, weekday: Weekday) -> Option<&DaySchedule> {
        self.days[weekday.num_days_from_sunday() as usize].as_ref()
    }

    /// Replace the schedule for `weekday`.
    pub fn set(&mut self, weekday: Weekday, schedule: Option<DaySchedule>) {
        self.days[weekday.num_days_from_sunday() as usize] = schedule;
    }

    /// The schedule for the weekday that `date` falls on.
    pub fn for_date(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.get(date.weekday())
    }
}

/// Error returned when a stored working-hours object uses a key other than
/// `"0"`..`"6"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid weekday key '{0}', expected \"0\" through \"6\"")]
pub struct InvalidWeekdayKey(pub String);

impl TryFrom<BTreeMap<String, DaySchedule>> for WorkingHours {
    type Error = InvalidWeekdayKey;

    fn try_from(map: BTreeMap<String, DaySchedule>) -> Result<Self, Self::Error> {
        let mut days: [Option<DaySchedule>; DAYS_PER_WEEK] = Default::default();
        for (key, schedule) in map {
            let index: usize = key
                .trim()
                .parse()
                .ok()
                .filter(|i| *i < DAYS_PER_WEEK)
                .ok_or_else(|| InvalidWeekdayKey(key.clone()))?;
            days[index] = Some(schedule);
        }
        Ok(Self { days })
    }
}

impl From<WorkingHours> for BTreeMap<String, DaySchedule> {
    fn from(hours: WorkingHours) -> Self {
        hours
            .days
            .into_iter()
            .enumerate()
            .filter_map(|(i, day)| day.map(|d| (i.to_string(), d)))
            .collect()
    }
}

/// Booking rules for one provider, as stored in the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Weekly opening hours.
    pub working_hours: WorkingHours,
    /// Minutes between candidate slot starts (15, 30, 60, ...).
    pub slot_interval: u32,
    /// Turnover minutes appended after each appointment.
    pub buffer_minutes: u32,
    /// IANA zone name shown to clients. Never used for conversion.
    pub timezone: String,
    /// Minimum notice, in hours, between now and a slot start.
    pub min_advance_hours: f64,
    /// How many days ahead bookings may be requested.
    pub max_advance_days: u32,
}

impl Default for ProviderSettings {
    /// Settings used for providers that never saved their own: weekdays
    /// 09:00-18:00, Saturday 10:00-15:00, Sunday closed, 30-minute grid,
    /// no buffer, two hours notice and a 60-day horizon.
    fn default() -> Self {
        let weekday = || Some(DaySchedule::open("09:00", "18:00"));
        Self {
            working_hours: WorkingHours::from_days([
                Some(DaySchedule::closed()),
                weekday(),
                weekday(),
                weekday(),
                weekday(),
                weekday(),
                Some(DaySchedule::open("10:00", "15:00")),
            ]),
            slot_interval: 30,
            buffer_minutes: 0,
            timezone: "America/Santiago".to_string(),
            min_advance_hours: 2.0,
            max_advance_days: 60,
        }
    }
}

impl ProviderSettings {
    /// Parse settings from their stored JSON form.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        if !settings.has_known_timezone() {
            tracing::warn!(timezone = %settings.timezone, "unknown IANA timezone label");
        }
        Ok(settings)
    }

    /// Minimum notice as a duration. Negative, NaN and infinite values count
    /// as no notice; absurdly large values saturate at ten years.
    pub fn min_advance(&self) -> TimeDelta {
        const MAX_HOURS: f64 = 24.0 * 366.0 * 10.0;
        let hours = self.min_advance_hours;
        if !hours.is_finite() || hours <= 0.0 {
            return TimeDelta::zero();
        }
        let millis = (hours.min(MAX_HOURS) * 3_600_000.0).round() as i64;
        TimeDelta::milliseconds(millis)
    }

    /// Latest instant a target date's midnight may fall on, relative to `now`.
    pub fn booking_horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(TimeDelta::days(i64::from(self.max_advance_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `date` lies beyond the booking horizon.
    pub fn is_beyond_horizon(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        date.and_time(NaiveTime::MIN).and_utc() > self.booking_horizon(now)
    }

    /// Whether `timezone` names a zone in the IANA database.
    pub fn has_known_timezone(&self) -> bool {
        self.timezone.parse::<chrono_tz::Tz>().is_ok()
    }
}
