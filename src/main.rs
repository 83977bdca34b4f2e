use chrono::{Datelike, Utc};
use chrono_english::{Dialect, parse_date_string};
use clap::Parser;
use log::debug;

mod cli;
mod output;

use carflux::time::{parse_time_of_day, select_timezone, utc_offset_hours};
use carflux::{FluxConfig, FluxRequest, compute, compute_profile};
use cli::Args;

// ===================== MAIN =====================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let tz = select_timezone(&args.timezone, args.latitude, args.longitude)?;

    // Anchor 'today' to the target timezone
    let anchor_time = Utc::now().with_timezone(&tz);
    let date = match &args.date {
        Some(s) => parse_date_string(s, anchor_time, Dialect::Us)?.with_timezone(&tz),
        None => anchor_time,
    }
    .date_naive();

    let (hour, minute) = parse_time_of_day(&args.at)?;

    // A fixed offset wins; otherwise use the zone's offset at the requested local time.
    // A profile keeps that one offset for the whole day.
    let utc_offset = match args.utc_offset {
        Some(hours) => hours,
        None => utc_offset_hours(tz, date, hour, minute)?,
    };
    debug!("Using time zone {} (UTC offset {} h) on {}", tz, utc_offset, date);

    let config = FluxConfig::default()
        .with_efficiency(args.efficiency)
        .with_altitude(args.altitude)
        .with_linke_turbidity(args.linke_turbidity);

    let request = FluxRequest {
        latitude: args.latitude,
        longitude: args.longitude,
        utc_offset_hours: utc_offset,
        year: date.year(),
        month: date.month(),
        day: date.day(),
        hour,
        minute,
        heading_deg: args.heading,
    };

    if let Some(step) = args.profile_step {
        let samples = compute_profile(&args.mesh, &request, step, &config)?;
        if args.json {
            output::print_json(&samples)?;
        } else {
            output::print_profile(&request, &samples);
        }
        return Ok(());
    }

    let report = compute(&args.mesh, &request, &config)?;
    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_report(&request, &report);
    }

    Ok(())
}

/// Default log filter for a `-v` count; `RUST_LOG` still takes precedence.
fn default_log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_logging(verbosity: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_log_level(verbosity)))
        .format_timestamp(None)
        .init();
}
