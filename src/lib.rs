//! Solar car surface flux.
//!
//! Estimates the instantaneous electrical power of a solar car's
//! photovoltaic surface, described as a triangulated mesh, for a given
//! location, local time and car heading.
//!
//! ```no_run
//! use carflux::{FluxConfig, FluxRequest, compute};
//!
//! let request = FluxRequest {
//!     latitude: -12.46,
//!     longitude: 130.84,
//!     utc_offset_hours: 9.5,
//!     year: 2025,
//!     month: 8,
//!     day: 24,
//!     hour: 12,
//!     minute: 30.0,
//!     heading_deg: 0.0,
//! };
//! let report = compute("car.msh", &request, &FluxConfig::default())?;
//! println!("{:.1} W from {:.2} m²", report.flux_w, report.area_m2);
//! # Ok::<(), carflux::FluxError>(())
//! ```

pub mod compute;
pub mod error;
pub mod flux;
pub mod geometry;
pub mod irradiance;
pub mod mesh;
pub mod solar;
pub mod sun_vector;
pub mod time;

pub use compute::{FluxReport, FluxRequest, ProfileSample, compute, compute_profile, compute_with};
pub use error::{FluxError, Result};
pub use flux::{FluxConfig, FluxTotals, integrate_flux};
pub use geometry::{SurfaceGeometry, TriangleGeometry, compute_geometry};
pub use mesh::{Mesh, Node, Triangle, load_mesh, parse_mesh};
pub use solar::{SolarAngles, SpaSunModel, SunModel};
pub use sun_vector::build_sun_vector;
