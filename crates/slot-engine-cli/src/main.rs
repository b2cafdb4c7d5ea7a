//! `slots` CLI — compute provider availability and check bookings from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Availability for a day with the default provider settings
//! slots available --date 2026-03-16 --duration 60
//!
//! # With stored settings and that day's bookings (stdin)
//! cat bookings.json | slots available --date 2026-03-16 -s settings.json -b -
//!
//! # Pin the clock for reproducible output
//! slots available --date 2026-03-16 --now 2026-03-10T12:00:00Z
//!
//! # Which bookings overlap a proposed appointment?
//! slots check --start 2026-03-16T10:00:00Z --duration 60 -b bookings.json
//!
//! # Full validation of a booking request (grid, hours, notice, conflicts)
//! slots validate --start 2026-03-16T10:00:00Z --duration 60 -b bookings.json
//!
//! # Print the default provider settings
//! slots defaults
//! ```
//!
//! Log output goes to stderr and is controlled by `SLOTS_LOG`
//! (e.g. `SLOTS_LOG=debug`).

use std::io::{self, Read};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::booking::parse_timestamp;
use slot_engine::conflict::BookingConflict;
use slot_engine::request::validate_booking_request;
use slot_engine::{
    find_conflicts, resolve_availability, AvailabilityQuery, BookingRecord, ExistingBooking,
    ProviderSettings,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Booking availability for appointment-based providers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookable slots for one day
    Available {
        /// Target day (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Service duration in minutes (15-480, defaults to 60)
        #[arg(long)]
        duration: Option<String>,
        /// Provider settings JSON (defaults apply if omitted)
        #[arg(short, long)]
        settings: Option<String>,
        /// Bookings JSON array, or "-" for stdin
        #[arg(short, long)]
        bookings: Option<String>,
        /// Evaluate as of this instant instead of the wall clock
        #[arg(long, env = "SLOTS_NOW")]
        now: Option<String>,
    },
    /// Report existing bookings that overlap a proposed appointment
    Check {
        /// Proposed start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Proposed length in minutes, including any buffer
        #[arg(long)]
        duration: u32,
        /// Booking records JSON array, or "-" for stdin
        #[arg(short, long)]
        bookings: Option<String>,
        /// Booking id to ignore (the booking being moved)
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Validate a booking request against the provider's rules
    Validate {
        /// Requested start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Service duration in minutes
        #[arg(long)]
        duration: u32,
        /// Provider settings JSON (defaults apply if omitted)
        #[arg(short, long)]
        settings: Option<String>,
        /// Booking records JSON array, or "-" for stdin
        #[arg(short, long)]
        bookings: Option<String>,
        /// Booking id to ignore (the booking being moved)
        #[arg(long)]
        exclude: Option<String>,
        /// Evaluate as of this instant instead of the wall clock
        #[arg(long, env = "SLOTS_NOW")]
        now: Option<String>,
    },
    /// Print the default provider settings as JSON
    Defaults,
}

#[derive(Serialize)]
struct CheckOutput {
    conflict: bool,
    conflicts: Vec<ConflictDto>,
}

#[derive(Serialize)]
struct ConflictDto {
    booking_id: String,
    start: String,
    end: String,
    overlap_minutes: i64,
}

impl From<&BookingConflict> for ConflictDto {
    fn from(c: &BookingConflict) -> Self {
        Self {
            booking_id: c.booking_id.clone(),
            start: c.start.to_rfc3339(),
            end: c.end.to_rfc3339(),
            overlap_minutes: c.overlap_minutes,
        }
    }
}

#[derive(Serialize)]
struct ValidateOutput {
    start: String,
    end: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Available {
            date,
            duration,
            settings,
            bookings,
            now,
        } => {
            let query = AvailabilityQuery::parse(&date, duration.as_deref())?;
            let settings = read_settings(settings.as_deref())?;
            let bookings: Vec<ExistingBooking> = read_bookings(bookings.as_deref())?;
            let now = resolve_now(now.as_deref())?;

            let response = resolve_availability(&query, settings.as_ref(), &bookings, now);
            print_json(&response)?;
        }
        Commands::Check {
            start,
            duration,
            bookings,
            exclude,
        } => {
            let start = parse_timestamp(&start)?;
            let end = start
                .checked_add_signed(TimeDelta::minutes(i64::from(duration)))
                .context("Proposed end is out of range")?;
            let records: Vec<BookingRecord> = read_bookings(bookings.as_deref())?;

            let conflicts = find_conflicts(&records, start, end, exclude.as_deref());
            print_json(&CheckOutput {
                conflict: !conflicts.is_empty(),
                conflicts: conflicts.iter().map(ConflictDto::from).collect(),
            })?;
        }
        Commands::Validate {
            start,
            duration,
            settings,
            bookings,
            exclude,
            now,
        } => {
            let settings = read_settings(settings.as_deref())?.unwrap_or_default();
            let records: Vec<BookingRecord> = read_bookings(bookings.as_deref())?;
            let now = resolve_now(now.as_deref())?;

            let booking = validate_booking_request(
                &start,
                duration,
                &settings,
                &records,
                exclude.as_deref(),
                now,
            )?;
            print_json(&ValidateOutput {
                start: booking.start.to_rfc3339(),
                end: booking.end.to_rfc3339(),
            })?;
        }
        Commands::Defaults => {
            print_json(&ProviderSettings::default())?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("SLOTS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => parse_timestamp(raw).context("Invalid --now"),
        None => Ok(Utc::now()),
    }
}

fn read_settings(path: Option<&str>) -> Result<Option<ProviderSettings>> {
    let Some(path) = path else {
        tracing::debug!("no settings file given, using defaults");
        return Ok(None);
    };
    let json = read_input(path)?;
    let settings = ProviderSettings::from_json(&json)
        .with_context(|| format!("Failed to parse settings: {}", path))?;
    Ok(Some(settings))
}

/// Read a JSON array of bookings. No path means no bookings.
fn read_bookings<T: serde::de::DeserializeOwned>(path: Option<&str>) -> Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let json = read_input(path)?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse bookings: {}", path))
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", pretty);
    Ok(())
}
