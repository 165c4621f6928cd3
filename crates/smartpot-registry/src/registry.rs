//! [`SensorRegistry`] – name-keyed sensor store.
//!
//! Lookups of unknown names are an expected outcome and are reported as
//! `None` / `Ok(false)`, never as an error.  Errors are reserved for values
//! that violate a sensor's invariants (kind mismatch, non-finite numbers,
//! bounds on text).
//!
//! Iteration order is lexicographic by sensor name.

use std::collections::BTreeMap;

use smartpot_types::{Bounds, PotError, PotResult, Sensor, SensorValue};
use tracing::debug;

/// Name-keyed map of [`Sensor`] records.
///
/// Construct with [`SensorRegistry::new`] (or a
/// [`RegistryBuilder`][crate::builder::RegistryBuilder]), introduce sensors
/// with [`SensorRegistry::provision`], then read and update them with
/// [`SensorRegistry::get`], [`SensorRegistry::set`] and
/// [`SensorRegistry::replace`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorRegistry {
    sensors: BTreeMap<String, Sensor>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Introduce `name` with its initial record.  Provisioning a name that
    /// already exists replaces its record.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] for an empty name or a record that fails
    /// [`Sensor::validate`].
    pub fn provision(&mut self, name: impl Into<String>, sensor: Sensor) -> PotResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(PotError::invalid("", "sensor name must not be empty"));
        }
        sensor.validate(&name)?;
        debug!(sensor = %name, value = %sensor.value, "provisioned sensor");
        self.sensors.insert(name, sensor);
        Ok(())
    }

    /// Look up `name`.  Never fails; `None` when the name is absent.
    pub fn get(&self, name: &str) -> Option<&Sensor> {
        self.sensors.get(name)
    }

    /// `true` when `name` has been provisioned.
    pub fn contains(&self, name: &str) -> bool {
        self.sensors.contains_key(name)
    }

    /// Overwrite the payload of an existing sensor, keeping its bounds.
    ///
    /// Returns `Ok(false)` without touching the registry when `name` was
    /// never provisioned.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] when `value` does not match the sensor's
    /// kind or is not finite.  The registry is left unchanged.
    pub fn set(&mut self, name: &str, value: SensorValue) -> PotResult<bool> {
        let Some(sensor) = self.sensors.get_mut(name) else {
            return Ok(false);
        };
        sensor.accepts(name, &value)?;
        sensor.value = value;
        Ok(true)
    }

    /// Read-modify-write an existing sensor.
    ///
    /// `mutate` receives the current record and returns its replacement.  The
    /// replacement must keep the sensor's kind and satisfy
    /// [`Sensor::validate`]; otherwise nothing is written.
    ///
    /// Returns `Ok(false)` when `name` is absent (`mutate` is not called).
    ///
    /// # Errors
    ///
    /// Whatever `mutate` returns, or [`PotError::InvalidValue`] when the
    /// replacement is invalid.
    pub fn replace<F>(&mut self, name: &str, mutate: F) -> PotResult<bool>
    where
        F: FnOnce(&Sensor) -> PotResult<Sensor>,
    {
        let Some(current) = self.sensors.get_mut(name) else {
            return Ok(false);
        };
        let next = mutate(current)?;
        current.accepts(name, &next.value)?;
        next.validate(name)?;
        *current = next;
        Ok(true)
    }

    /// Replace only the bounds of a numeric sensor.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] when the sensor is textual.
    pub fn set_bounds(&mut self, name: &str, bounds: Bounds) -> PotResult<bool> {
        self.replace(name, |current| {
            Ok(Sensor {
                value: current.value.clone(),
                bounds: Some(bounds),
            })
        })
    }

    /// Number of provisioned sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Iterate `(name, sensor)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Sensor)> {
        self.sensors.iter().map(|(name, sensor)| (name.as_str(), sensor))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }
}
