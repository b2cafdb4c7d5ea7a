//! Tests for single-day slot generation.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use slot_engine::generator::Unavailability;
use slot_engine::schedule::DAYS_PER_WEEK;
use slot_engine::{
    day_availability, generate_slots, BookingStatus, DaySchedule, ExistingBooking,
    ProviderSettings, WorkingHours,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Monday 2026-03-16.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, minute, 0).unwrap()
}

/// The evening before, far enough ahead that notice never bites.
fn day_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap()
}

/// Every day open 09:00-18:00 with the given grid and buffer, no notice.
fn settings(slot_interval: u32, buffer_minutes: u32) -> ProviderSettings {
    let days: [Option<DaySchedule>; DAYS_PER_WEEK] =
        std::array::from_fn(|_| Some(DaySchedule::open("09:00", "18:00")));
    ProviderSettings {
        working_hours: WorkingHours::from_days(days),
        slot_interval,
        buffer_minutes,
        timezone: "America/Santiago".to_string(),
        min_advance_hours: 0.0,
        max_advance_days: 60,
    }
}

fn booking(start: &str, end: &str, status: BookingStatus) -> ExistingBooking {
    ExistingBooking::new(start, end, status)
}

fn labels(slots: &[slot_engine::AvailableSlot]) -> Vec<&str> {
    slots.iter().map(|s| s.local.as_str()).collect()
}

// ── Basic grid ──────────────────────────────────────────────────────────────

#[test]
fn open_day_without_bookings_fills_the_grid() {
    let slots = generate_slots(monday(), 60, &settings(30, 0), &[], day_before());

    // 09:00, 09:30, ..., 17:00
    assert_eq!(slots.len(), 17);
    assert_eq!(slots[0].start, at(9, 0));
    assert_eq!(slots[0].end, at(10, 0));
    assert_eq!(slots[16].start, at(17, 0));
    assert_eq!(slots[16].end, at(18, 0));
    for pair in slots.windows(2) {
        assert_eq!(pair[1].start - pair[0].start, TimeDelta::minutes(30));
    }
}

#[test]
fn local_label_renders_start_time() {
    let slots = generate_slots(monday(), 60, &settings(60, 0), &[], day_before());
    assert_eq!(
        labels(&slots),
        vec!["09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00"]
    );
}

#[test]
fn slot_interval_longer_than_duration_leaves_gaps() {
    let slots = generate_slots(monday(), 30, &settings(60, 0), &[], day_before());
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0].end, at(9, 30));
    assert_eq!(slots[1].start, at(10, 0));
}

// ── Existing bookings ───────────────────────────────────────────────────────

#[test]
fn confirmed_booking_blocks_overlapping_candidates() {
    let bookings = vec![booking(
        "2026-03-16T10:00:00Z",
        "2026-03-16T11:00:00Z",
        BookingStatus::Confirmed,
    )];
    let slots = generate_slots(monday(), 60, &settings(30, 0), &bookings, day_before());
    let labels = labels(&slots);

    assert!(labels.contains(&"09:00"), "touching the booking is allowed");
    assert!(!labels.contains(&"09:30"));
    assert!(!labels.contains(&"10:00"));
    assert!(!labels.contains(&"10:30"));
    assert!(labels.contains(&"11:00"), "starting at the booking end is allowed");
    assert_eq!(slots.len(), 14);
}

#[test]
fn cancelled_booking_is_ignored() {
    let bookings = vec![booking(
        "2026-03-16T10:00:00Z",
        "2026-03-16T11:00:00Z",
        BookingStatus::Cancelled,
    )];
    let with = generate_slots(monday(), 60, &settings(30, 0), &bookings, day_before());
    let without = generate_slots(monday(), 60, &settings(30, 0), &[], day_before());
    assert_eq!(with, without);
    assert_eq!(with.len(), 17);
}

#[test]
fn pending_completed_and_unknown_statuses_all_occupy() {
    for status in [
        BookingStatus::Pending,
        BookingStatus::Completed,
        BookingStatus::Unknown,
    ] {
        let bookings = vec![booking(
            "2026-03-16T09:00:00Z",
            "2026-03-16T17:00:00Z",
            status,
        )];
        let slots = generate_slots(monday(), 60, &settings(30, 0), &bookings, day_before());
        assert_eq!(labels(&slots), vec!["17:00"], "status {status:?}");
    }
}

#[test]
fn malformed_bookings_are_dropped_not_fatal() {
    let bookings = vec![
        booking("not a time", "2026-03-16T11:00:00Z", BookingStatus::Confirmed),
        booking("2026-03-16T10:00:00Z", "garbage", BookingStatus::Confirmed),
        // Inverted range
        booking(
            "2026-03-16T12:00:00Z",
            "2026-03-16T11:00:00Z",
            BookingStatus::Confirmed,
        ),
        // Empty range
        booking(
            "2026-03-16T12:00:00Z",
            "2026-03-16T12:00:00Z",
            BookingStatus::Confirmed,
        ),
    ];
    let slots = generate_slots(monday(), 60, &settings(30, 0), &bookings, day_before());
    assert_eq!(slots.len(), 17);
}

#[test]
fn booking_without_end_uses_duration_snapshot() {
    let bookings = vec![ExistingBooking {
        start_time: "2026-03-16T09:00:00".to_string(),
        end_time: None,
        status: BookingStatus::Confirmed,
        duration_snapshot: Some(120),
    }];
    let slots = generate_slots(monday(), 60, &settings(60, 0), &bookings, day_before());
    assert_eq!(slots[0].start, at(11, 0));
}

#[test]
fn booking_with_offset_timestamp_is_normalized_to_utc() {
    // 07:00-08:00 at -03:00 is 10:00-11:00 UTC.
    let bookings = vec![booking(
        "2026-03-16T07:00:00-03:00",
        "2026-03-16T08:00:00-03:00",
        BookingStatus::Confirmed,
    )];
    let slots = generate_slots(monday(), 60, &settings(60, 0), &bookings, day_before());
    assert!(!labels(&slots).contains(&"10:00"));
    assert!(labels(&slots).contains(&"11:00"));
}

#[test]
fn fully_booked_day_yields_nothing_but_keeps_window() {
    let bookings = vec![booking(
        "2026-03-16T09:00:00Z",
        "2026-03-16T18:00:00Z",
        BookingStatus::Confirmed,
    )];
    let day = day_availability(monday(), 60, &settings(30, 0), &bookings, day_before());
    assert!(day.slots.is_empty());
    let window = day.working_hours.unwrap();
    assert_eq!(window.start, "09:00");
    assert_eq!(window.end, "18:00");
    assert_eq!(day.unavailable, Some(Unavailability::FullyBooked));
}

// ── Buffer ──────────────────────────────────────────────────────────────────

#[test]
fn buffer_extends_occupancy_but_not_visible_end() {
    let slots = generate_slots(monday(), 60, &settings(15, 15), &[], day_before());
    let last = slots.last().unwrap();
    assert_eq!(last.start, at(16, 45));
    assert_eq!(last.end, at(17, 45));
    assert_eq!(slots[0].end - slots[0].start, TimeDelta::minutes(60));
}

#[test]
fn buffer_on_thirty_minute_grid_stops_at_half_past_four() {
    let slots = generate_slots(monday(), 60, &settings(30, 15), &[], day_before());
    assert_eq!(slots.last().unwrap().start, at(16, 30));
}

#[test]
fn buffer_must_clear_before_next_booking() {
    // Slot 09:00 + 60 min + 15 buffer runs to 10:15, into a 10:00 booking.
    let bookings = vec![booking(
        "2026-03-16T10:00:00Z",
        "2026-03-16T11:00:00Z",
        BookingStatus::Confirmed,
    )];
    let slots = generate_slots(monday(), 60, &settings(30, 15), &bookings, day_before());
    assert!(!labels(&slots).contains(&"09:00"));
    assert_eq!(slots[0].start, at(11, 0));
}

#[test]
fn buffer_filling_the_window_yields_nothing() {
    let slots = generate_slots(monday(), 60, &settings(30, 540), &[], day_before());
    assert!(slots.is_empty());
}

// ── Advance notice and alignment ───────────────────────────────────────────

#[test]
fn notice_reaching_closing_time_yields_nothing() {
    let mut s = settings(30, 0);
    s.min_advance_hours = 2.0;
    let slots = generate_slots(monday(), 60, &s, &[], at(16, 0));
    assert!(slots.is_empty());
}

#[test]
fn notice_pushes_first_slot_later() {
    let mut s = settings(30, 0);
    s.min_advance_hours = 2.0;
    let slots = generate_slots(monday(), 60, &s, &[], at(10, 0));
    assert_eq!(slots[0].start, at(12, 0));
}

#[test]
fn earliest_candidate_rounds_up_to_grid_anchored_at_opening() {
    let slots = generate_slots(monday(), 60, &settings(30, 0), &[], at(9, 10));
    assert_eq!(slots[0].start, at(9, 30));
}

#[test]
fn sub_second_now_still_lands_on_grid() {
    let now = at(10, 0) + TimeDelta::milliseconds(1);
    let slots = generate_slots(monday(), 60, &settings(30, 0), &[], now);
    assert_eq!(slots[0].start, at(10, 30));
}

#[test]
fn candidate_exactly_on_grid_is_kept() {
    let slots = generate_slots(monday(), 60, &settings(30, 0), &[], at(10, 0));
    assert_eq!(slots[0].start, at(10, 0));
}

#[test]
fn grid_follows_opening_time_not_the_clock() {
    let mut s = settings(30, 0);
    s.working_hours.set(chrono::Weekday::Mon, Some(DaySchedule::open("9:15", "12:00")));
    let slots = generate_slots(monday(), 30, &s, &[], at(9, 20));
    assert_eq!(labels(&slots), vec!["09:45", "10:15", "10:45", "11:15"]);
}

#[test]
fn fractional_notice_hours_are_honoured() {
    let mut s = settings(15, 0);
    s.min_advance_hours = 1.5;
    let slots = generate_slots(monday(), 60, &s, &[], at(9, 0));
    assert_eq!(slots[0].start, at(10, 30));
}

#[test]
fn past_day_yields_nothing() {
    let next_day = Utc.with_ymd_and_hms(2026, 3, 17, 9, 0, 0).unwrap();
    let slots = generate_slots(monday(), 60, &settings(30, 0), &[], next_day);
    assert!(slots.is_empty());
}

// ── Closed days and degenerate input ───────────────────────────────────────

#[test]
fn disabled_day_yields_nothing() {
    let mut s = settings(30, 0);
    s.working_hours.set(
        chrono::Weekday::Mon,
        Some(DaySchedule {
            start: "09:00".to_string(),
            end: "18:00".to_string(),
            enabled: false,
        }),
    );
    let day = day_availability(monday(), 60, &s, &[], day_before());
    assert!(day.slots.is_empty());
    assert_eq!(day.working_hours, None);
    assert_eq!(day.unavailable, Some(Unavailability::Closed));
}

#[test]
fn missing_day_yields_nothing() {
    let mut s = settings(30, 0);
    s.working_hours.set(chrono::Weekday::Mon, None);
    assert!(generate_slots(monday(), 60, &s, &[], day_before()).is_empty());
}

#[test]
fn unparseable_hours_yield_nothing() {
    for (start, end) in [("9am", "18:00"), ("09:00", "25:00"), ("09:00:00", "18:00")] {
        let mut s = settings(30, 0);
        s.working_hours
            .set(chrono::Weekday::Mon, Some(DaySchedule::open(start, end)));
        let day = day_availability(monday(), 60, &s, &[], day_before());
        assert!(day.slots.is_empty(), "{start}-{end}");
        assert_eq!(day.unavailable, Some(Unavailability::Closed));
    }
}

#[test]
fn inverted_hours_yield_nothing() {
    let mut s = settings(30, 0);
    s.working_hours
        .set(chrono::Weekday::Mon, Some(DaySchedule::open("18:00", "09:00")));
    assert!(generate_slots(monday(), 60, &s, &[], day_before()).is_empty());
}

#[test]
fn zero_duration_yields_nothing() {
    assert!(generate_slots(monday(), 0, &settings(30, 0), &[], day_before()).is_empty());
}

#[test]
fn zero_interval_yields_nothing() {
    assert!(generate_slots(monday(), 60, &settings(0, 0), &[], day_before()).is_empty());
}

#[test]
fn duration_longer_than_day_yields_nothing() {
    assert!(generate_slots(monday(), 600, &settings(30, 0), &[], day_before()).is_empty());
}

// ── Booking horizon ────────────────────────────────────────────────────────

#[test]
fn date_beyond_horizon_yields_nothing() {
    let now = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let s = ProviderSettings::default();

    // Exactly 60 days ahead is still bookable.
    let last_day = NaiveDate::from_ymd_opt(2026, 5, 15).unwrap();
    assert!(!generate_slots(last_day, 60, &s, &[], now).is_empty());

    let too_far = NaiveDate::from_ymd_opt(2026, 5, 16).unwrap();
    let day = day_availability(too_far, 60, &s, &[], now);
    assert!(day.slots.is_empty());
    assert_eq!(day.working_hours, None);
    assert_eq!(day.unavailable, Some(Unavailability::BeyondHorizon));
}

// ── Default settings ───────────────────────────────────────────────────────

#[test]
fn default_settings_close_on_sunday_and_shorten_saturday() {
    let s = ProviderSettings::default();
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

    let sunday = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
    assert!(generate_slots(sunday, 60, &s, &[], now).is_empty());

    let saturday = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    let slots = generate_slots(saturday, 60, &s, &[], now);
    assert_eq!(slots.first().unwrap().local, "10:00");
    assert_eq!(slots.last().unwrap().local, "14:00");
}

#[test]
fn bad_rows_from_storage_do_not_hide_valid_bookings() {
    let json = r#"[
        {"start_time": null, "end_time": "2026-03-16T12:00:00Z", "status": "CONFIRMED"},
        {"start_time": "2026-03-16T13:00:00Z", "end_time": false, "status": "CONFIRMED"},
        {"start_time": "2026-03-16T10:00:00Z", "end_time": "2026-03-16T11:00:00Z"}
    ]"#;
    let bookings: Vec<ExistingBooking> = serde_json::from_str(json).unwrap();
    assert_eq!(bookings[2].status, BookingStatus::Unknown);

    let slots = generate_slots(monday(), 60, &settings(60, 0), &bookings, day_before());
    assert_eq!(
        labels(&slots),
        vec!["09:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00"]
    );
}
