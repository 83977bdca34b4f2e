//! Output Formatting Module
//!
//! Terminal and JSON rendering of flux reports.

use carflux::{FluxReport, FluxRequest, ProfileSample};
use serde::Serialize;

// ===================== FORMATTING HELPERS =====================

/// Format power output for display
pub fn format_power(watts: f64) -> String {
    if watts >= 1000.0 { format!("{:.2} kW", watts / 1000.0) } else { format!("{:.1} W", watts) }
}

/// Format irradiance for display
pub fn format_irradiance(w_per_m2: f64) -> String {
    format!("{:.0} W/m²", w_per_m2)
}

/// Format a fractional local clock time as HH:MM[:SS]
pub fn format_clock(hour: u32, minute: f64) -> String {
    let total_seconds = (minute * 60.0).round() as u32;
    let (m, s) = (total_seconds / 60, total_seconds % 60);
    if s == 0 { format!("{:02}:{:02}", hour, m) } else { format!("{:02}:{:02}:{:02}", hour, m, s) }
}

fn format_offset(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    let sign = if total_minutes < 0 { '-' } else { '+' };
    let m = total_minutes.abs();
    format!("UTC{}{:02}:{:02}", sign, m / 60, m % 60)
}

// ===================== TERMINAL OUTPUT =====================

fn print_request(request: &FluxRequest) {
    println!("Location : lat={:.6}, lon={:.6}", request.latitude, request.longitude);
    println!(
        "Date     : {:04}-{:02}-{:02} ({})",
        request.year,
        request.month,
        request.day,
        format_offset(request.utc_offset_hours)
    );
    println!("Heading  : {:.1}°", request.heading_deg);
}

/// Print a single-instant report.
pub fn print_report(request: &FluxRequest, report: &FluxReport) {
    print_request(request);
    println!("Time     : {}", format_clock(request.hour, request.minute));
    println!();

    println!("=== Sun ===");
    println!("Elevation  : {:.2}°", report.sun.elevation_deg);
    println!("Azimuth    : {:.2}°", report.sun.azimuth_deg);
    println!("Day angle  : {:.2}°", report.sun.day_angle_deg);
    println!("Irradiance : {}", format_irradiance(report.irradiance_w_m2));
    println!();

    println!("=== Surface ===");
    println!("Area       : {:.3} m²", report.area_m2);
    println!("Triangles  : {} ({} facing away from the sun)", report.triangle_count, report.shaded_count);
    println!("Power      : {}", format_power(report.flux_w));
}

/// Print a daily profile as a table.
pub fn print_profile(request: &FluxRequest, samples: &[ProfileSample]) {
    print_request(request);
    println!();
    println!("{:>8}  {:>9}  {:>9}  {:>10}  {:>10}  {:>7}", "Time", "Elev", "Azimuth", "Irradiance", "Power", "Shaded");
    for s in samples {
        let r = &s.report;
        println!(
            "{:>8}  {:>8.2}°  {:>8.2}°  {:>10}  {:>10}  {:>7}",
            format_clock(s.hour, s.minute),
            r.sun.elevation_deg,
            r.sun.azimuth_deg,
            format_irradiance(r.irradiance_w_m2),
            format_power(r.flux_w),
            r.shaded_count
        );
    }

    if let Some(peak) = samples.iter().max_by(|a, b| a.report.flux_w.total_cmp(&b.report.flux_w)) {
        println!();
        println!("Peak power : {} at {}", format_power(peak.report.flux_w), format_clock(peak.hour, peak.minute));
    }
}

// ===================== JSON OUTPUT =====================

/// Print any report value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
