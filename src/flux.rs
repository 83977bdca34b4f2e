//! Flux Integration Module
//!
//! Projects the sun vector onto every triangle normal and sums the usable
//! electrical power. Triangles facing away from the sun contribute nothing
//! and are counted as shaded.

use log::debug;
use nalgebra::Vector3;

use crate::geometry::TriangleGeometry;

// ===================== CONSTANTS =====================

/// Photovoltaic cell conversion efficiency of the reference car
pub const DEFAULT_CELL_EFFICIENCY: f64 = 0.239;

/// mm² → m²
pub const MM2_TO_M2: f64 = 1.0e-6;

/// Default Linke turbidity factor for clear atmosphere
pub const DEFAULT_LINKE_TURBIDITY: f64 = 3.0;

// ===================== CONFIGURATION =====================

/// Physical constants of a flux computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxConfig {
    /// Cell conversion efficiency (0.0 - 1.0)
    pub cell_efficiency: f64,
    /// Factor converting mesh area units to m²
    pub mm2_to_m2: f64,
    /// Observer altitude above sea level in meters (clear-sky model)
    pub altitude_m: f64,
    /// Linke turbidity factor (clear-sky model, 2-7 typical)
    pub linke_turbidity: f64,
}

impl Default for FluxConfig {
    fn default() -> Self {
        Self {
            cell_efficiency: DEFAULT_CELL_EFFICIENCY,
            mm2_to_m2: MM2_TO_M2,
            altitude_m: 0.0,
            linke_turbidity: DEFAULT_LINKE_TURBIDITY,
        }
    }
}

impl FluxConfig {
    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.cell_efficiency = efficiency;
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    pub fn with_linke_turbidity(mut self, lt: f64) -> Self {
        self.linke_turbidity = lt;
        self
    }
}

// ===================== INTEGRATION =====================

/// Aggregate of one flux integration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FluxTotals {
    /// Total power in W
    pub flux_w: f64,
    /// Triangles whose normal faces away from the sun
    pub shaded_count: usize,
}

/// Unclamped power of one triangle in W.
///
/// The normal's length is twice the triangle area in mm², hence the 0.5.
pub fn raw_contribution(
    sun: &Vector3<f64>,
    normal: &Vector3<f64>,
    irradiance_w_m2: f64,
    config: &FluxConfig,
) -> f64 {
    config.cell_efficiency * irradiance_w_m2 * 0.5 * sun.dot(normal) * config.mm2_to_m2
}

/// Power of one triangle in W, clamped at zero for shaded triangles.
pub fn triangle_contribution(
    sun: &Vector3<f64>,
    normal: &Vector3<f64>,
    irradiance_w_m2: f64,
    config: &FluxConfig,
) -> f64 {
    raw_contribution(sun, normal, irradiance_w_m2, config).max(0.0)
}

/// Sum the clamped contribution of every triangle, exactly once each.
pub fn integrate_flux(
    sun: &Vector3<f64>,
    triangles: &[TriangleGeometry],
    irradiance_w_m2: f64,
    config: &FluxConfig,
) -> FluxTotals {
    let totals = triangles.iter().fold(FluxTotals::default(), |mut acc, tri| {
        let contribution = raw_contribution(sun, &tri.normal, irradiance_w_m2, config);
        if contribution < 0.0 {
            acc.shaded_count += 1;
        } else {
            acc.flux_w += contribution;
        }
        acc
    });

    debug!(
        "Integrated {} triangles: {:.3} W, {} shaded",
        triangles.len(),
        totals.flux_w,
        totals.shaded_count
    );
    totals
}

// ===================== TESTS =====================
