//! Sensor payloads and their "normal" ranges.
//!
//! A [`Sensor`] pairs a [`SensorValue`] (numeric *or* textual, never both)
//! with optional [`Bounds`].  Bounds only make sense for numeric sensors;
//! [`Sensor::validate`] rejects the combination of text and bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PotError, PotResult};

/// The active payload of a sensor.
///
/// Serialised untagged so that `2.5` and `"Red"` both decode naturally from
/// config files and pub/sub payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Numeric(f64),
    Text(String),
}

impl SensorValue {
    /// `true` when `self` and `other` carry the same variant.
    pub fn same_kind(&self, other: &SensorValue) -> bool {
        matches!(
            (self, other),
            (SensorValue::Numeric(_), SensorValue::Numeric(_))
                | (SensorValue::Text(_), SensorValue::Text(_))
        )
    }

    /// `"numeric"` or `"text"`, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SensorValue::Numeric(_) => "numeric",
            SensorValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Numeric(v) => write!(f, "{v}"),
            SensorValue::Text(s) => f.write_str(s),
        }
    }
}

/// Closed `[min, max]` range with `min <= max` guaranteed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct Bounds {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawBounds {
    min: f64,
    max: f64,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = PotError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Bounds::new(raw.min, raw.max)
    }
}

impl Bounds {
    /// Build a range.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidBounds`] when `min > max` or either side is not a
    /// finite number.
    pub fn new(min: f64, max: f64) -> PotResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(PotError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound, inclusive.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound, inclusive.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Centre of the range.  Halved before summing so that bounds near
    /// `f64::MAX` stay finite.
    pub fn midpoint(&self) -> f64 {
        self.min / 2.0 + self.max / 2.0
    }
}

/// A named measurement as stored in the registry (the name is the key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub value: SensorValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl Sensor {
    /// Unbounded numeric sensor.
    pub fn numeric(value: f64) -> Self {
        Self {
            value: SensorValue::Numeric(value),
            bounds: None,
        }
    }

    /// Textual sensor (never bounded).
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: SensorValue::Text(value.into()),
            bounds: None,
        }
    }

    /// Numeric sensor with a `[min, max]` normal range.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidBounds`] when `min > max`.
    pub fn bounded(value: f64, min: f64, max: f64) -> PotResult<Self> {
        Ok(Self {
            value: SensorValue::Numeric(value),
            bounds: Some(Bounds::new(min, max)?),
        })
    }

    /// The payload as a number; `None` for text sensors.
    pub fn as_numeric(&self) -> Option<f64> {
        match self.value {
            SensorValue::Numeric(v) => Some(v),
            SensorValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            SensorValue::Text(s) => Some(s),
            SensorValue::Numeric(_) => None,
        }
    }

    /// Strictly below the lower bound.  Unbounded sensors never are.
    pub fn is_below_min(&self) -> bool {
        match (self.as_numeric(), self.bounds) {
            (Some(v), Some(b)) => v < b.min(),
            _ => false,
        }
    }

    /// Strictly above the upper bound.  Unbounded sensors never are.
    pub fn is_above_max(&self) -> bool {
        match (self.as_numeric(), self.bounds) {
            (Some(v), Some(b)) => v > b.max(),
            _ => false,
        }
    }

    /// Check the record's own invariants before it enters the registry.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] for non-finite numbers or bounds attached
    /// to a text payload.
    pub fn validate(&self, name: &str) -> PotResult<()> {
        match &self.value {
            SensorValue::Numeric(v) if !v.is_finite() => {
                Err(PotError::invalid(name, format!("{v} is not a finite number")))
            }
            SensorValue::Text(_) if self.bounds.is_some() => {
                Err(PotError::invalid(name, "text sensors cannot carry bounds"))
            }
            _ => Ok(()),
        }
    }

    /// Check that `value` may replace this sensor's current payload.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] on a kind mismatch or a non-finite number.
    pub fn accepts(&self, name: &str, value: &SensorValue) -> PotResult<()> {
        if !self.value.same_kind(value) {
            return Err(PotError::invalid(
                name,
                format!(
                    "expected a {} value, got {}",
                    self.value.kind_name(),
                    value.kind_name()
                ),
            ));
        }
        if let SensorValue::Numeric(v) = value
            && !v.is_finite()
        {
            return Err(PotError::invalid(name, format!("{v} is not a finite number")));
        }
        Ok(())
    }

    /// Interpret an untyped string (e.g. an HTTP path segment) as a value of
    /// this sensor's kind.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] when a numeric sensor receives text that
    /// does not parse as a finite float.
    pub fn coerce(&self, name: &str, raw: &str) -> PotResult<SensorValue> {
        match self.value {
            SensorValue::Numeric(_) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(SensorValue::Numeric(v)),
                _ => Err(PotError::invalid(name, format!("'{raw}' is not a valid number"))),
            },
            SensorValue::Text(_) => Ok(SensorValue::Text(raw.to_string())),
        }
    }
}
