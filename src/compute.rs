//! Flux Computation Module
//!
//! Sequences the pipeline: mesh → geometry → sun angles and irradiance →
//! sun vector → per-triangle flux → report. Every call is independent; no
//! state survives between calls.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use log::info;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{FluxError, Result};
use crate::flux::{FluxConfig, integrate_flux};
use crate::geometry::{SurfaceGeometry, compute_geometry};
use crate::mesh::{Mesh, load_mesh};
use crate::solar::{SolarAngles, SpaSunModel, SunModel};
use crate::sun_vector::build_sun_vector;

// ===================== REQUEST =====================

const NANOS_PER_HOUR: u64 = 3_600_000_000_000;

/// Place, time and heading of one flux evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxRequest {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
    /// Offset of the local clock from UTC, in hours (may be fractional)
    pub utc_offset_hours: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Hour of the local clock (0-23)
    pub hour: u32,
    /// Minute of the local clock, fractional (0 <= minute < 60)
    pub minute: f64,
    /// Car heading in degrees, clockwise from facing west
    pub heading_deg: f64,
}

impl FluxRequest {
    /// Same place, date and heading at another local time of day.
    pub fn at(&self, hour: u32, minute: f64) -> Self {
        Self { hour, minute, ..*self }
    }

    /// The requested instant with its fixed UTC offset.
    ///
    /// # Errors
    /// `AstronomicalInput` for an impossible date, time of day or offset
    pub fn local_datetime(&self) -> Result<DateTime<FixedOffset>> {
        let invalid = |what: String| FluxError::AstronomicalInput(what);

        if !self.utc_offset_hours.is_finite() {
            return Err(invalid(format!("invalid UTC offset {}", self.utc_offset_hours)));
        }
        let offset = FixedOffset::east_opt((self.utc_offset_hours * 3600.0).round() as i32)
            .ok_or_else(|| invalid(format!("UTC offset out of range: {} h", self.utc_offset_hours)))?;

        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            invalid(format!("invalid date {:04}-{:02}-{:02}", self.year, self.month, self.day))
        })?;

        if self.hour > 23 || !(0.0..60.0).contains(&self.minute) {
            return Err(invalid(format!("invalid time of day {}:{}", self.hour, self.minute)));
        }
        // Rounding must not carry a minute just below 60 into the next hour
        let nanos = ((self.minute * 60.0e9).round() as u64).min(NANOS_PER_HOUR - 1);
        let secs = self.hour * 3600 + (nanos / 1_000_000_000) as u32;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, (nanos % 1_000_000_000) as u32)
            .ok_or_else(|| invalid(format!("invalid time of day {}:{}", self.hour, self.minute)))?;

        offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .ok_or_else(|| invalid(format!("unrepresentable local time {} {}", date, time)))
    }
}

// ===================== REPORT =====================

/// Outcome of one flux evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluxReport {
    /// Instantaneous electrical power in W
    pub flux_w: f64,
    /// Total surface area in m²
    pub area_m2: f64,
    /// Number of retained triangles
    pub triangle_count: usize,
    /// Triangles facing away from the sun
    pub shaded_count: usize,
    pub sun: SolarAngles,
    /// Irradiance used, in W/m²
    pub irradiance_w_m2: f64,
}

/// One entry of a daily profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    pub hour: u32,
    pub minute: f64,
    pub report: FluxReport,
}

// ===================== PIPELINE =====================

/// Load the mesh at `mesh_path` and evaluate the flux for `request` with the
/// SPA sun model.
///
/// # Errors
/// Mesh loading and astronomical errors, unchanged
pub fn compute(mesh_path: impl AsRef<Path>, request: &FluxRequest, config: &FluxConfig) -> Result<FluxReport> {
    let mesh = load_mesh(mesh_path)?;
    compute_with(&mesh, &SpaSunModel::from_config(config), request, config)
}

/// Evaluate the flux of an already loaded mesh with any sun model.
pub fn compute_with(
    mesh: &Mesh,
    model: &dyn SunModel,
    request: &FluxRequest,
    config: &FluxConfig,
) -> Result<FluxReport> {
    let surface = compute_geometry(mesh, config);
    evaluate(&surface, model, request, config)
}

/// Flux at regular steps over the request's local day, from 00:00 up to but
/// excluding 24:00. The mesh and its geometry are loaded once; every sample
/// is an independent instantaneous evaluation.
pub fn compute_profile(
    mesh_path: impl AsRef<Path>,
    request: &FluxRequest,
    step_minutes: u32,
    config: &FluxConfig,
) -> Result<Vec<ProfileSample>> {
    if step_minutes == 0 {
        return Err(FluxError::AstronomicalInput("profile step must be at least one minute".into()));
    }
    let mesh = load_mesh(mesh_path)?;
    let surface = compute_geometry(&mesh, config);
    let model = SpaSunModel::from_config(config);

    let times: Vec<(u32, f64)> =
        (0..24 * 60).step_by(step_minutes as usize).map(|m| (m / 60, (m % 60) as f64)).collect();

    let sample = |&(hour, minute): &(u32, f64)| -> Result<ProfileSample> {
        let report = evaluate(&surface, &model, &request.at(hour, minute), config)?;
        Ok(ProfileSample { hour, minute, report })
    };

    #[cfg(feature = "parallel")]
    let samples = times.par_iter().map(sample).collect();
    #[cfg(not(feature = "parallel"))]
    let samples = times.iter().map(sample).collect();

    samples
}

fn evaluate(
    surface: &SurfaceGeometry,
    model: &dyn SunModel,
    request: &FluxRequest,
    config: &FluxConfig,
) -> Result<FluxReport> {
    let sun = model.solar_angles(request)?;
    let irradiance_w_m2 = model.irradiance(sun.elevation_deg, sun.day_angle_deg);
    let sun_vector =
        build_sun_vector(sun.elevation_deg, sun.azimuth_deg, sun.day_angle_deg, request.heading_deg);

    let totals = integrate_flux(&sun_vector, &surface.triangles, irradiance_w_m2, config);

    let report = FluxReport {
        flux_w: totals.flux_w,
        area_m2: surface.total_area_m2,
        triangle_count: surface.len(),
        shaded_count: totals.shaded_count,
        sun,
        irradiance_w_m2,
    };
    info!(
        "Flux {:.2} W over {:.3} m² ({} triangles, {} shaded) at irradiance {:.1} W/m²",
        report.flux_w, report.area_m2, report.triangle_count, report.shaded_count, irradiance_w_m2
    );
    Ok(report)
}

// ===================== TESTS =====================
