//! Error Module
//!
//! One error type for the whole flux pipeline. Nothing is recovered locally:
//! every variant is fatal for the computation that raised it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FluxError>;

#[derive(Debug, Error)]
pub enum FluxError {
    /// The mesh source could not be opened or read.
    #[error("cannot read mesh file {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Section markers are missing or misordered, a record does not parse,
    /// or a triangle references a node that does not exist.
    #[error("malformed mesh at line {line}: {reason}")]
    MalformedMesh { line: usize, reason: String },

    /// Date, time, offset or location rejected before reaching the sun model.
    #[error("invalid astronomical input: {0}")]
    AstronomicalInput(String),

    /// Failure reported by the solar position algorithm itself.
    #[error("solar position calculation failed: {0}")]
    SolarPosition(#[from] solar_positioning::Error),
}

impl FluxError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        FluxError::MalformedMesh { line, reason: reason.into() }
    }

    /// True for the variants that describe bad date/time/location input.
    pub fn is_astronomical(&self) -> bool {
        matches!(self, FluxError::AstronomicalInput(_) | FluxError::SolarPosition(_))
    }
}
