//! Sun Direction Module
//!
//! Builds the sun direction in the car's local frame.
//!
//! Frame conventions:
//! - +y is north, +x is east, +z is up
//! - the car's nose points along -x (west) at zero heading
//! - heading is the car's rotation about +z; turning the car clockwise is the
//!   same as turning the sun counter-clockwise, so the rotation is applied to
//!   the sun vector instead of the mesh

use nalgebra::{Rotation3, Vector3};

/// Sun direction for the given solar angles and car heading (all in degrees).
///
/// The result is not unit length: its z component is `sin(day_angle)`, a
/// seasonal proxy term from the day-of-year angle, not an elevation
/// projection.
pub fn build_sun_vector(
    elevation_deg: f64,
    azimuth_deg: f64,
    day_angle_deg: f64,
    heading_deg: f64,
) -> Vector3<f64> {
    let raw = Vector3::new(
        elevation_deg.to_radians().sin(),
        azimuth_deg.to_radians().cos(),
        day_angle_deg.to_radians().sin(),
    );
    rotate_heading(&raw, heading_deg)
}

/// Rotate `v` by `heading_deg` about the vertical axis.
///
/// x' = x cos θ - y sin θ, y' = x sin θ + y cos θ, z' = z
pub fn rotate_heading(v: &Vector3<f64>, heading_deg: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), heading_deg.to_radians()) * v
}

// ===================== TESTS =====================
