//! Clear-Sky Irradiance Module
//!
//! Implements the Ineichen-Perez clear-sky model used to estimate the solar
//! irradiance reaching the car.
//!
//! References:
//! - Ineichen, P. and Perez, R. (2002). "A new airmass independent formulation
//!   for the Linke turbidity coefficient"
//! - Spencer, J. W. (1971). "Fourier series representation of the position of
//!   the sun"

// ===================== CONSTANTS =====================

/// Solar constant (Total Solar Irradiance) in W/m²
/// Latest value from SORCE/TIM measurements
pub const SOLAR_CONSTANT: f64 = 1361.0;

// ===================== RESULTS =====================

/// Clear-sky irradiance components in W/m²
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearSky {
    /// Direct Normal Irradiance
    pub dni: f64,
    /// Diffuse Horizontal Irradiance
    pub dhi: f64,
    /// Global Horizontal Irradiance
    pub ghi: f64,
}

// ===================== DAY ANGLE =====================

/// Spencer day angle in degrees for a day of year (1-366).
///
/// 0° on January 1st, advancing 360/365 degrees per day.
pub fn day_angle_deg(day_of_year: u32) -> f64 {
    360.0 * (day_of_year as f64 - 1.0) / 365.0
}

// ===================== ATMOSPHERIC CALCULATIONS =====================

/// Calculate absolute air mass (pressure-corrected)
///
/// Kasten-Young (1989) relative air mass with the International Standard
/// Atmosphere pressure correction.
pub fn air_mass(sun_elevation_deg: f64, altitude_m: f64) -> f64 {
    if sun_elevation_deg <= 0.0 {
        return f64::INFINITY;
    }

    let zenith_deg = 90.0 - sun_elevation_deg;
    let zenith_rad = zenith_deg.to_radians();

    let am_relative = 1.0 / (zenith_rad.cos() + 0.50572 * (96.07995 - zenith_deg).powf(-1.6364));

    // P / P0 = (1 - 2.25577e-5 * h)^5.25588, troposphere only
    let pressure_ratio =
        if altitude_m.abs() < 1e-5 { 1.0 } else { (1.0 - 2.25577e-5 * altitude_m).powf(5.25588) };

    am_relative * pressure_ratio
}

/// Extraterrestrial irradiance corrected for Earth-Sun distance
///
/// # Arguments
/// * `day_angle_deg` - Spencer day angle in degrees (see [`day_angle_deg`])
///
/// # Returns
/// Extraterrestrial irradiance in W/m²
pub fn extraterrestrial_irradiance(day_angle_deg: f64) -> f64 {
    let b = day_angle_deg.to_radians();

    let eccentricity_correction = 1.000110
        + 0.034221 * b.cos()
        + 0.001280 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin();

    SOLAR_CONSTANT * eccentricity_correction
}

// ===================== INEICHEN-PEREZ CLEAR SKY MODEL =====================

/// Clear-sky irradiance using the Ineichen-Perez model
///
/// # Arguments
/// * `sun_elevation_deg` - Sun elevation in degrees
/// * `altitude_m` - Observer altitude in meters
/// * `day_angle_deg` - Spencer day angle in degrees
/// * `linke_turbidity` - Linke turbidity factor (typical 2-7)
///
/// # Returns
/// All-zero components while the sun is at or below the horizon
pub fn clear_sky(
    sun_elevation_deg: f64,
    altitude_m: f64,
    day_angle_deg: f64,
    linke_turbidity: f64,
) -> ClearSky {
    if sun_elevation_deg <= 0.0 {
        return ClearSky::default();
    }

    let am = air_mass(sun_elevation_deg, altitude_m);
    if !am.is_finite() || am <= 0.0 {
        return ClearSky::default();
    }

    let i0 = extraterrestrial_irradiance(day_angle_deg);
    let sin_elev = sun_elevation_deg.to_radians().sin();

    // Coefficients drift outside the troposphere
    let clamped_alt = altitude_m.clamp(-500.0, 11000.0);

    let fh1 = (-clamped_alt / 8000.0).exp();
    let fh2 = (-clamped_alt / 1250.0).exp();

    let altitude_km = clamped_alt / 1000.0;
    let tl = (linke_turbidity - 0.15 * altitude_km).max(1.0);

    let cg1 = 5.09e-5 * clamped_alt + 0.868;
    let cg2 = 3.92e-5 * clamped_alt + 0.0387;

    let b = 0.664 + 0.163 / fh1;
    let exponent = -cg2 * am * (fh1 + fh2 * (tl - 1.0));
    let dni = (b * i0 * exponent.exp()).max(0.0).min(i0);

    let ghi_raw = (cg1 * i0 * sin_elev * (exponent * 1.1).exp()).max(0.0);

    // GHI cannot be less than the direct beam hitting the ground
    let direct_horizontal = dni * sin_elev;
    let ghi = ghi_raw.max(direct_horizontal);
    let dhi = (ghi - direct_horizontal).max(0.0);

    ClearSky { dni, dhi, ghi }
}

// ===================== TESTS =====================
