use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide error type spanning lookup failures, rejected values,
/// provisioning gaps, and transport/config faults.
///
/// A missing sensor is *not* an error at the registry or gateway level (it
/// is reported as `Ok(false)` / `None`); [`PotError::NotFound`] exists for
/// the ingress layers that must render it as a distinct response.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PotError {
    #[error("Sensor not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {sensor}: {details}")]
    InvalidValue { sensor: String, details: String },

    #[error("Invalid bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("No plant profile provisioned")]
    MissingProfile,

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Decode Error: {0}")]
    Decode(String),

    #[error("Config Error: {0}")]
    Config(String),
}

impl PotError {
    /// Shorthand for [`PotError::InvalidValue`].
    pub fn invalid(sensor: impl Into<String>, details: impl Into<String>) -> Self {
        PotError::InvalidValue {
            sensor: sensor.into(),
            details: details.into(),
        }
    }
}

pub type PotResult<T> = Result<T, PotError>;
