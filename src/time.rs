//! Time and Timezone Utilities Module
//!
//! Turns user-facing time input (clock strings, zone names, locations) into
//! the fixed UTC offset and local clock fields a flux request needs.

use chrono::{NaiveDate, NaiveTime, Offset, TimeZone, Timelike};
use chrono_tz::Tz;
use iana_time_zone::get_timezone;
use log::warn;
use std::sync::OnceLock;
use tzf_rs::DefaultFinder;

// tzf-rs DefaultFinder is pre-compiled and very fast
static TZF_FINDER: OnceLock<DefaultFinder> = OnceLock::new();

// ===================== TIME PARSING =====================

/// Parse a clock string in HH:MM[:SS[.fffffffff]] format.
///
/// # Returns
/// Tuple of (hour, fractional minute)
pub fn parse_time_of_day(s: &str) -> Result<(u32, f64), String> {
    let formats = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

    for fmt in formats {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            let minute = t.minute() as f64 + (t.second() as f64 + t.nanosecond() as f64 * 1e-9) / 60.0;
            return Ok((t.hour(), minute));
        }
    }
    Err(format!("Invalid time {:?}. Use HH:MM, HH:MM:SS, or HH:MM:SS.ns", s))
}

// ===================== TIMEZONE UTILITIES =====================

/// Get the system's configured timezone.
///
/// Falls back to UTC if the system timezone cannot be determined.
pub fn system_timezone() -> Tz {
    get_timezone().ok().and_then(|s| s.parse().ok()).unwrap_or(Tz::UTC)
}

/// Resolve timezone from geographic coordinates, or UTC if unknown.
pub fn resolve_timezone(lon: f64, lat: f64) -> Tz {
    let finder = TZF_FINDER.get_or_init(DefaultFinder::new);
    let tzid = finder.get_tz_name(lon, lat);
    tzid.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Resolve a zone selector: "system", "location", or an IANA name.
pub fn select_timezone(selector: &str, lat: f64, lon: f64) -> Result<Tz, String> {
    match selector {
        "system" => Ok(system_timezone()),
        "location" => Ok(resolve_timezone(lon, lat)),
        name => name.parse::<Tz>().map_err(|_| format!("Unknown time zone {:?}", name)),
    }
}

/// UTC offset in hours of `tz` at a local date and time.
///
/// Ambiguous local times (DST fall-back) use the earlier instant; times
/// inside a DST gap are rejected.
pub fn utc_offset_hours(tz: Tz, date: NaiveDate, hour: u32, minute: f64) -> Result<f64, String> {
    let whole_minute = minute.floor() as u32;
    let naive = date
        .and_hms_opt(hour, whole_minute, 0)
        .ok_or_else(|| format!("Invalid local time {:02}:{:05.2}", hour, minute))?;

    let local = match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(t) => t,
        chrono::LocalResult::Ambiguous(t1, t2) => {
            warn!(
                "Local time {} is ambiguous in {} (DST transition); using {} rather than {}",
                naive,
                tz,
                t1.format("%H:%M %Z"),
                t2.format("%H:%M %Z")
            );
            t1
        }
        chrono::LocalResult::None => {
            return Err(format!("The time {} does not exist in {} (DST gap)", naive, tz));
        }
    };

    Ok(local.offset().fix().local_minus_utc() as f64 / 3600.0)
}

// ===================== TESTS =====================
