//! Command-Line Interface Module
//!
//! Handles argument parsing and validation for the carflux application.

use std::path::PathBuf;

use clap::Parser;

use carflux::flux::{DEFAULT_CELL_EFFICIENCY, DEFAULT_LINKE_TURBIDITY};

// ===================== CLI =====================

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Triangulated surface mesh of the car (gmsh ASCII, lengths in mm)
    #[arg(long, default_value = "test.msh", env = "CARFLUX_MESH")]
    pub mesh: PathBuf,

    /// Car latitude in decimal degrees (-90 to 90)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_latitude, env = "CARFLUX_LATITUDE")]
    pub latitude: f64,
    /// Car longitude in decimal degrees (-180 to 180)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_longitude, env = "CARFLUX_LONGITUDE")]
    pub longitude: f64,

    /// Date for calculations (e.g., "2025-08-24" or "today"); defaults to today
    #[arg(long)]
    pub date: Option<String>,
    /// Local time of day (HH:MM[:SS[.fffffffff]]); defaults to 12:00
    #[arg(long, default_value = "12:00")]
    pub at: String,
    /// Time zone of the local clock ("system", "location", or IANA time zone name)
    #[arg(long, default_value = "location", env = "CARFLUX_TIMEZONE")]
    pub timezone: String,
    /// Fixed UTC offset in hours; overrides --timezone
    #[arg(long, allow_hyphen_values = true, value_parser = parse_utc_offset)]
    pub utc_offset: Option<f64>,

    /// Car heading in degrees, clockwise rotation from facing west
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub heading: f64,

    /// Cell conversion efficiency (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_CELL_EFFICIENCY, value_parser = parse_efficiency, env = "CARFLUX_EFFICIENCY")]
    pub efficiency: f64,
    /// Altitude above mean sea level (meters, may be negative)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true, value_parser = parse_altitude, env = "CARFLUX_ALTITUDE")]
    pub altitude: f64,
    /// Linke turbidity factor for clear-sky model (2-7 typical, 3 = clear)
    #[arg(long, default_value_t = DEFAULT_LINKE_TURBIDITY, value_parser = parse_turbidity, env = "CARFLUX_LINKE_TURBIDITY")]
    pub linke_turbidity: f64,

    /// Print the flux over the whole day at this step (minutes) instead of a single instant
    #[arg(long, value_parser = parse_step)]
    pub profile_step: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

// ===================== CLI VALUE PARSERS =====================

fn parse_latitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-90.0..=90.0).contains(&v) {
        return Err(format!("Latitude must be between -90 and 90, got {}", v));
    }
    Ok(v)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-180.0..=180.0).contains(&v) {
        return Err(format!("Longitude must be between -180 and 180, got {}", v));
    }
    Ok(v)
}

fn parse_utc_offset(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-14.0..=14.0).contains(&v) {
        return Err(format!("UTC offset must be between -14 and 14 hours, got {}", v));
    }
    Ok(v)
}

fn parse_altitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-500.0..=11000.0).contains(&v) {
        return Err(format!("Altitude must be between -500 and 11000 meters, got {}", v));
    }
    Ok(v)
}

fn parse_efficiency(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("Efficiency must be between 0.0 and 1.0, got {}", v));
    }
    Ok(v)
}

fn parse_turbidity(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(1.0..=10.0).contains(&v) {
        return Err(format!("Linke turbidity must be between 1.0 and 10.0, got {}", v));
    }
    Ok(v)
}

fn parse_step(s: &str) -> Result<u32, String> {
    let v: u32 = s.parse().map_err(|_| format!("Invalid integer: {}", s))?;
    if !(1..=720).contains(&v) {
        return Err(format!("Profile step must be between 1 and 720 minutes, got {}", v));
    }
    Ok(v)
}
