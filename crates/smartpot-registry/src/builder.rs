//! [`RegistryBuilder`] – fluent provisioning of a [`SensorRegistry`].
//!
//! Validation is deferred to [`RegistryBuilder::build`] so a whole sensor
//! list can be declared in one expression and rejected as a unit.
//!
//! # Example
//!
//! ```rust
//! use smartpot_registry::RegistryBuilder;
//!
//! let registry = RegistryBuilder::new()
//!     .with_bounded("soilHumidity", 2.0, 3.0, 6.0)
//!     .with_text("soilType", "Red")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.len(), 2);
//! ```

use smartpot_types::{PotResult, Sensor};

use crate::registry::SensorRegistry;

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, PotResult<Sensor>)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sensor set a freshly flashed pot ships with.
    ///
    /// | Sensor | Value | Bounds |
    /// |---|---|---|
    /// | `soilHumidity` | 2 | [3, 6] |
    /// | `luminosity` | 2 | [4, 5] |
    /// | `temperature` | 3 | [3, 3] |
    /// | `humidity` | 3 | [3, 3] |
    /// | `soilPh` | 3 | [3, 3] |
    /// | `soilType` | `"Red"` | – |
    /// | `phosphorus` / `nitrogen` / `potassium` | 2 | [2, 5] |
    pub fn factory_preset() -> Self {
        Self::new()
            .with_bounded("soilHumidity", 2.0, 3.0, 6.0)
            .with_bounded("luminosity", 2.0, 4.0, 5.0)
            .with_bounded("temperature", 3.0, 3.0, 3.0)
            .with_text("soilType", "Red")
            .with_bounded("humidity", 3.0, 3.0, 3.0)
            .with_bounded("soilPh", 3.0, 3.0, 3.0)
            .with_bounded("phosphorus", 2.0, 2.0, 5.0)
            .with_bounded("nitrogen", 2.0, 2.0, 5.0)
            .with_bounded("potassium", 2.0, 2.0, 5.0)
    }

    pub fn with_sensor(mut self, name: impl Into<String>, sensor: Sensor) -> Self {
        self.entries.push((name.into(), Ok(sensor)));
        self
    }

    pub fn with_numeric(self, name: impl Into<String>, value: f64) -> Self {
        self.with_sensor(name, Sensor::numeric(value))
    }

    pub fn with_bounded(mut self, name: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        self.entries
            .push((name.into(), Sensor::bounded(value, min, max)));
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_sensor(name, Sensor::text(value))
    }

    /// Consume the builder and provision every declared sensor in order.
    ///
    /// # Errors
    ///
    /// The first invalid declaration (bad bounds, empty name, …).
    pub fn build(self) -> PotResult<SensorRegistry> {
        let mut registry = SensorRegistry::new();
        for (name, sensor) in self.entries {
            registry.provision(name, sensor?)?;
        }
        Ok(registry)
    }
}
