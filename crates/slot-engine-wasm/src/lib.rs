//! WASM bindings for slot-engine.
//!
//! Exposes availability computation, conflict checks and booking validation to
//! the JavaScript booking front-end via `wasm-bindgen`. All complex types cross
//! the boundary as JSON strings.
//!
//! The JSON handling lives in [`api`], which returns plain `Result<String,
//! String>` so it can be exercised natively; the `#[wasm_bindgen]` exports
//! below only convert errors into `JsValue`s.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use wasm_bindgen::prelude::*;

pub mod api {
    //! JSON-in, JSON-out wrappers around the engine.

    use chrono::{DateTime, TimeDelta, Utc};
    use serde::{Deserialize, Serialize};
    use slot_engine::booking::parse_timestamp;
    use slot_engine::request::{parse_date, validate_booking_request};
    use slot_engine::{
        find_conflicts, generate_slots, resolve_availability, AvailabilityQuery, BookingRecord,
        ExistingBooking, ProviderSettings,
    };

    /// Input for [`availability`]: the same parameters the availability
    /// endpoint receives, plus the data the handler would load from storage.
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AvailabilityInput {
        pub date: String,
        #[serde(default)]
        pub duration: Option<DurationParam>,
        #[serde(default)]
        pub settings: Option<ProviderSettings>,
        #[serde(default)]
        pub bookings: Vec<ExistingBooking>,
        #[serde(default)]
        pub now: Option<String>,
    }

    /// A duration sent either as a JSON number or as query-string text.
    #[derive(Deserialize)]
    #[serde(untagged)]
    pub enum DurationParam {
        Minutes(f64),
        Text(String),
    }

    impl DurationParam {
        fn as_text(&self) -> String {
            match self {
                // Fractional minutes truncate, as the text form does.
                DurationParam::Minutes(m) => format!("{}", m.trunc()),
                DurationParam::Text(t) => t.clone(),
            }
        }
    }

    #[derive(Serialize)]
    struct ConflictDto {
        booking_id: String,
        start: String,
        end: String,
        overlap_minutes: i64,
    }

    #[derive(Serialize)]
    struct CheckDto {
        conflict: bool,
        conflicts: Vec<ConflictDto>,
    }

    #[derive(Serialize)]
    struct ProposedBookingDto {
        start: String,
        end: String,
    }

    fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
        serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
    }

    fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, String> {
        match now {
            Some(raw) => parse_timestamp(raw).map_err(|e| e.to_string()),
            None => Ok(Utc::now()),
        }
    }

    fn parse_settings(json: Option<&str>) -> Result<ProviderSettings, String> {
        match json {
            Some(json) if !json.trim().is_empty() => {
                ProviderSettings::from_json(json).map_err(|e| e.to_string())
            }
            _ => Ok(ProviderSettings::default()),
        }
    }

    /// Full availability response for one day.
    pub fn availability(request_json: &str) -> Result<String, String> {
        let input: AvailabilityInput = serde_json::from_str(request_json)
            .map_err(|e| format!("Invalid request JSON: {}", e))?;
        let duration = input.duration.as_ref().map(DurationParam::as_text);
        let query = AvailabilityQuery::parse(&input.date, duration.as_deref())
            .map_err(|e| e.to_string())?;
        let now = resolve_now(input.now.as_deref())?;

        let response = resolve_availability(&query, input.settings.as_ref(), &input.bookings, now);
        to_json(&response)
    }

    /// Bare slot list for one day.
    pub fn slots(
        date: &str,
        duration_minutes: u32,
        settings_json: Option<&str>,
        bookings_json: &str,
        now: Option<&str>,
    ) -> Result<String, String> {
        let date = parse_date(date).map_err(|e| e.to_string())?;
        let settings = parse_settings(settings_json)?;
        let bookings: Vec<ExistingBooking> = serde_json::from_str(bookings_json)
            .map_err(|e| format!("Invalid bookings JSON: {}", e))?;
        let now = resolve_now(now)?;

        to_json(&generate_slots(date, duration_minutes, &settings, &bookings, now))
    }

    /// Overlapping bookings for a proposed `[start, start + duration)`.
    pub fn check_conflict(
        records_json: &str,
        start: &str,
        duration_minutes: u32,
        exclude_id: Option<&str>,
    ) -> Result<String, String> {
        let records: Vec<BookingRecord> = serde_json::from_str(records_json)
            .map_err(|e| format!("Invalid bookings JSON: {}", e))?;
        let start = parse_timestamp(start).map_err(|e| e.to_string())?;
        let end = start
            .checked_add_signed(TimeDelta::minutes(i64::from(duration_minutes)))
            .ok_or_else(|| "Proposed end is out of range".to_string())?;

        let conflicts = find_conflicts(&records, start, end, exclude_id);
        to_json(&CheckDto {
            conflict: !conflicts.is_empty(),
            conflicts: conflicts
                .into_iter()
                .map(|c| ConflictDto {
                    booking_id: c.booking_id,
                    start: c.start.to_rfc3339(),
                    end: c.end.to_rfc3339(),
                    overlap_minutes: c.overlap_minutes,
                })
                .collect(),
        })
    }

    /// Validate a booking request; errors carry the user-facing reason.
    pub fn validate_booking(
        start: &str,
        duration_minutes: u32,
        settings_json: Option<&str>,
        records_json: &str,
        exclude_id: Option<&str>,
        now: Option<&str>,
    ) -> Result<String, String> {
        let settings = parse_settings(settings_json)?;
        let records: Vec<BookingRecord> = serde_json::from_str(records_json)
            .map_err(|e| format!("Invalid bookings JSON: {}", e))?;
        let now = resolve_now(now)?;

        let booking =
            validate_booking_request(start, duration_minutes, &settings, &records, exclude_id, now)
                .map_err(|e| e.to_string())?;
        to_json(&ProposedBookingDto {
            start: booking.start.to_rfc3339(),
            end: booking.end.to_rfc3339(),
        })
    }

    /// The documented default provider settings.
    pub fn default_settings() -> Result<String, String> {
        to_json(&ProviderSettings::default())
    }
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// Compute the availability payload for one day.
///
/// `request_json` is `{date, duration?, settings?, bookings?, now?}`, where
/// `duration` may be a number or a string such as `"90"`; missing
/// settings fall back to the defaults and a missing `now` uses the browser
/// clock. Returns the response JSON (`{slots, workingHours, timezone, date,
/// message?, reason?}`).
#[wasm_bindgen(js_name = "availability")]
pub fn availability(request_json: &str) -> Result<String, JsValue> {
    api::availability(request_json).map_err(js_err)
}

/// Generate the slot list for one day.
///
/// `bookings_json` is a JSON array of `{start_time, end_time, status}` objects.
#[wasm_bindgen(js_name = "generateSlots")]
pub fn generate_slots(
    date: &str,
    duration_minutes: u32,
    settings_json: Option<String>,
    bookings_json: &str,
    now: Option<String>,
) -> Result<String, JsValue> {
    api::slots(
        date,
        duration_minutes,
        settings_json.as_deref(),
        bookings_json,
        now.as_deref(),
    )
    .map_err(js_err)
}

/// List stored bookings overlapping a proposed appointment.
#[wasm_bindgen(js_name = "checkConflict")]
pub fn check_conflict(
    records_json: &str,
    start: &str,
    duration_minutes: u32,
    exclude_id: Option<String>,
) -> Result<String, JsValue> {
    api::check_conflict(records_json, start, duration_minutes, exclude_id.as_deref())
        .map_err(js_err)
}

/// Validate a booking request before it is submitted.
#[wasm_bindgen(js_name = "validateBooking")]
pub fn validate_booking(
    start: &str,
    duration_minutes: u32,
    settings_json: Option<String>,
    records_json: &str,
    exclude_id: Option<String>,
    now: Option<String>,
) -> Result<String, JsValue> {
    api::validate_booking(
        start,
        duration_minutes,
        settings_json.as_deref(),
        records_json,
        exclude_id.as_deref(),
        now.as_deref(),
    )
    .map_err(js_err)
}

/// The default provider settings as JSON.
#[wasm_bindgen(js_name = "defaultSettings")]
pub fn default_settings() -> Result<String, JsValue> {
    api::default_settings().map_err(js_err)
}
