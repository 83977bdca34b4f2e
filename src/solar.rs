//! Solar Position Module
//!
//! The astronomical side of the flux computation: where the sun is and how
//! strong it is. The pipeline only sees the [`SunModel`] trait; the default
//! [`SpaSunModel`] uses the NREL SPA (Solar Position Algorithm) together with
//! the Ineichen-Perez clear-sky model.

use chrono::Datelike;
use log::debug;
use serde::Serialize;
use solar_positioning::{spa, time::DeltaT, types::RefractionCorrection};

use crate::compute::FluxRequest;
use crate::error::{FluxError, Result};
use crate::flux::FluxConfig;
use crate::irradiance::{clear_sky, day_angle_deg};

// ===================== TYPES =====================

/// Sun angles for one instant, all in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarAngles {
    /// Height above the horizon (refraction corrected)
    pub elevation_deg: f64,
    /// Bearing clockwise from north
    pub azimuth_deg: f64,
    /// Spencer day-of-year angle
    pub day_angle_deg: f64,
}

/// Source of sun angles and irradiance.
///
/// Implementations must be pure: the same request always yields the same
/// answer, and no state is kept between calls.
pub trait SunModel {
    /// Sun angles at the request's place and time.
    ///
    /// # Errors
    /// `AstronomicalInput` or `SolarPosition` for invalid date, time or location
    fn solar_angles(&self, request: &FluxRequest) -> Result<SolarAngles>;

    /// Irradiance in W/m² for a sun elevation and day angle.
    fn irradiance(&self, elevation_deg: f64, day_angle_deg: f64) -> f64;
}

// ===================== SPA MODEL =====================

/// SPA sun position with clear-sky direct normal irradiance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaSunModel {
    /// Observer altitude in meters
    pub altitude_m: f64,
    /// Linke turbidity factor (atmospheric clarity)
    pub linke_turbidity: f64,
}

impl SpaSunModel {
    pub fn from_config(config: &FluxConfig) -> Self {
        Self { altitude_m: config.altitude_m, linke_turbidity: config.linke_turbidity }
    }
}

impl Default for SpaSunModel {
    fn default() -> Self {
        Self::from_config(&FluxConfig::default())
    }
}

impl SunModel for SpaSunModel {
    fn solar_angles(&self, request: &FluxRequest) -> Result<SolarAngles> {
        validate_location(request.latitude, request.longitude)?;
        let when = request.local_datetime()?;

        let delta_t = DeltaT::estimate_from_date(when.year(), when.month())?;
        let position = spa::solar_position(
            when,
            request.latitude,
            request.longitude,
            self.altitude_m,
            delta_t,
            Some(RefractionCorrection::standard()),
        )?;

        let angles = SolarAngles {
            elevation_deg: position.elevation_angle(),
            azimuth_deg: position.azimuth(),
            day_angle_deg: day_angle_deg(when.ordinal()),
        };
        debug!(
            "Sun at {}: elevation {:.3}°, azimuth {:.3}°, day angle {:.3}°",
            when, angles.elevation_deg, angles.azimuth_deg, angles.day_angle_deg
        );
        Ok(angles)
    }

    fn irradiance(&self, elevation_deg: f64, day_angle_deg: f64) -> f64 {
        clear_sky(elevation_deg, self.altitude_m, day_angle_deg, self.linke_turbidity).dni
    }
}

fn validate_location(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(FluxError::AstronomicalInput(format!(
            "latitude must be between -90 and 90, got {}",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(FluxError::AstronomicalInput(format!(
            "longitude must be between -180 and 180, got {}",
            lon
        )));
    }
    Ok(())
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(lat: f64, lon: f64, utc_offset_hours: f64, ymd: (i32, u32, u32), hm: (u32, f64)) -> FluxRequest {
        FluxRequest {
            latitude: lat,
            longitude: lon,
            utc_offset_hours,
            year: ymd.0,
            month: ymd.1,
            day: ymd.2,
            hour: hm.0,
            minute: hm.1,
            heading_deg: 0.0,
        }
    }

    #[test]
    fn test_equinox_noon_on_equator_is_near_zenith() {
        let model = SpaSunModel::default();
        let angles = model.solar_angles(&request(0.0, 0.0, 0.0, (2025, 3, 20), (12, 7.0))).unwrap();
        assert!(angles.elevation_deg > 85.0, "elevation was {}", angles.elevation_deg);
        assert!(model.irradiance(angles.elevation_deg, angles.day_angle_deg) > 800.0);
    }

    #[test]
    fn test_winter_midnight_in_helsinki_is_dark() {
        let model = SpaSunModel::default();
        let angles = model.solar_angles(&request(60.17, 24.94, 2.0, (2025, 1, 15), (0, 0.0))).unwrap();
        assert!(angles.elevation_deg < -30.0, "elevation was {}", angles.elevation_deg);
        assert_eq!(model.irradiance(angles.elevation_deg, angles.day_angle_deg), 0.0);
    }

    #[test]
    fn test_morning_sun_is_in_the_east() {
        // Darwin, NT: UTC+9:30
        let model = SpaSunModel::default();
        let angles = model.solar_angles(&request(-12.46, 130.84, 9.5, (2025, 10, 12), (8, 30.0))).unwrap();
        assert!(angles.elevation_deg > 0.0);
        assert!(angles.azimuth_deg > 45.0 && angles.azimuth_deg < 135.0, "azimuth was {}", angles.azimuth_deg);
    }

    #[test]
    fn test_utc_offset_shifts_local_time() {
        let model = SpaSunModel::default();
        let utc = model.solar_angles(&request(45.0, 10.0, 0.0, (2025, 6, 1), (10, 0.0))).unwrap();
        let cet = model.solar_angles(&request(45.0, 10.0, 1.0, (2025, 6, 1), (11, 0.0))).unwrap();
        assert!((utc.elevation_deg - cet.elevation_deg).abs() < 1e-9);
        assert!((utc.azimuth_deg - cet.azimuth_deg).abs() < 1e-9);
    }

    #[test]
    fn test_day_angle_follows_calendar() {
        let model = SpaSunModel::default();
        let jan1 = model.solar_angles(&request(0.0, 0.0, 0.0, (2025, 1, 1), (12, 0.0))).unwrap();
        assert_eq!(jan1.day_angle_deg, 0.0);
    }

    #[test]
    fn test_invalid_inputs_are_astronomical_errors() {
        let model = SpaSunModel::default();
        let bad = [
            request(0.0, 0.0, 0.0, (2025, 2, 30), (12, 0.0)),
            request(0.0, 0.0, 0.0, (2025, 13, 1), (12, 0.0)),
            request(0.0, 0.0, 0.0, (2025, 6, 1), (24, 0.0)),
            request(0.0, 0.0, 0.0, (2025, 6, 1), (12, 60.0)),
            request(91.0, 0.0, 0.0, (2025, 6, 1), (12, 0.0)),
            request(0.0, -181.0, 0.0, (2025, 6, 1), (12, 0.0)),
            request(0.0, 0.0, 30.0, (2025, 6, 1), (12, 0.0)),
            request(f64::NAN, 0.0, 0.0, (2025, 6, 1), (12, 0.0)),
        ];
        for req in bad {
            let err = model.solar_angles(&req).unwrap_err();
            assert!(err.is_astronomical(), "{:?} gave {:?}", req, err);
        }
    }
}
