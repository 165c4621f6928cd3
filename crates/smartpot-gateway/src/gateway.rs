//! [`Gateway`] – serialised access to the registry and plant profile.
//!
//! One [`RwLock`] guards the whole [`PotState`]:
//!
//! | Operation | Access |
//! |---|---|
//! | [`Gateway::read_setting`], [`Gateway::list_settings`], [`Gateway::profile`] | shared |
//! | [`Gateway::run_diagnostic`], [`Gateway::with_snapshot`] | shared |
//! | [`Gateway::write_setting`], [`Gateway::write_raw`], [`Gateway::adjust_bounds`], [`Gateway::replace_setting`] | exclusive |
//! | [`Gateway::apply_correction`], [`Gateway::provision`], [`Gateway::set_profile`] | exclusive |
//!
//! Each call takes the lock exactly once and holds it for the whole
//! operation, so a read-modify-write can never interleave with another
//! writer and a diagnostic never sees half of a concurrent update.  Results
//! are returned by value; no reference into the state outlives a call.
//!
//! A poisoned lock is recovered rather than propagated: every mutation
//! validates before it writes, so the state behind a poisoned guard is
//! still consistent.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use smartpot_gateway::Gateway;
//! use smartpot_registry::RegistryBuilder;
//! use smartpot_types::{CheckId, PlantProfile, ResultCode, SensorValue};
//!
//! let registry = RegistryBuilder::new()
//!     .with_bounded("soilHumidity", 2.0, 3.0, 6.0)
//!     .build()
//!     .unwrap();
//! let gateway = Arc::new(Gateway::new(registry, PlantProfile::empty()));
//!
//! // Unknown names are reported, never created.
//! assert!(!gateway.write_setting("soilHumidty", SensorValue::Numeric(4.0)).unwrap());
//!
//! // Evaluating is read-only; applying persists the correction.
//! assert_eq!(gateway.run_diagnostic(CheckId::SoilMoisture).code(), ResultCode::Ok);
//! gateway.apply_correction(CheckId::SoilMoisture);
//! assert_eq!(gateway.read_setting("soilHumidity").unwrap().as_numeric(), Some(6.0));
//! ```

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use smartpot_diagnostics as diagnostics;
use smartpot_registry::SensorRegistry;
use smartpot_types::{
    Bounds, CheckId, Diagnosis, PlantProfile, PotError, PotResult, Sensor, SensorValue,
};
use tracing::{debug, info, instrument, warn};

/// Everything the gateway guards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PotState {
    pub registry: SensorRegistry,
    pub profile: PlantProfile,
}

/// The single entry point both ingress adapters call into.
///
/// Construct once at startup and share as `Arc<Gateway>`.
#[derive(Debug, Default)]
pub struct Gateway {
    state: RwLock<PotState>,
}

impl Gateway {
    /// Build a gateway around an already-provisioned registry.  Pass
    /// [`PlantProfile::empty`] when no plant is housed yet.
    pub fn new(registry: SensorRegistry, profile: PlantProfile) -> Self {
        Self {
            state: RwLock::new(PotState { registry, profile }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PotState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("gateway lock poisoned; recovering for read");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, PotState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("gateway lock poisoned; recovering for write");
            poisoned.into_inner()
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Shared access
    // ────────────────────────────────────────────────────────────────────────

    /// Copy of the sensor named `name`, or `None` when absent.
    pub fn read_setting(&self, name: &str) -> Option<Sensor> {
        self.read().registry.get(name).cloned()
    }

    /// Copy of every sensor in registry order.
    pub fn list_settings(&self) -> Vec<(String, Sensor)> {
        self.read()
            .registry
            .iter()
            .map(|(name, sensor)| (name.to_string(), sensor.clone()))
            .collect()
    }

    pub fn profile(&self) -> PlantProfile {
        self.read().profile.clone()
    }

    /// Evaluate `check` read-only against one consistent snapshot.
    pub fn run_diagnostic(&self, check: CheckId) -> Diagnosis {
        self.run_diagnostic_in_context(check).0
    }

    /// Like [`Gateway::run_diagnostic`], also reporting whether a plant was
    /// provisioned in the very snapshot the check saw.
    pub fn run_diagnostic_in_context(&self, check: CheckId) -> (Diagnosis, bool) {
        let state = self.read();
        let diagnosis = diagnostics::evaluate(check, &state.registry, &state.profile);
        debug!(check = %check, result = %diagnosis, "diagnostic evaluated");
        (diagnosis, state.profile.is_provisioned())
    }

    /// Run `f` as a single read transaction.  `f` must not block.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&PotState) -> R) -> R {
        f(&self.read())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Exclusive access
    // ────────────────────────────────────────────────────────────────────────

    /// Overwrite the payload of an existing sensor.
    ///
    /// Returns `Ok(false)` (registry untouched) when `name` was never
    /// provisioned.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] on a kind mismatch or non-finite number.
    #[instrument(level = "debug", skip(self))]
    pub fn write_setting(&self, name: &str, value: SensorValue) -> PotResult<bool> {
        self.write().registry.set(name, value)
    }

    /// Overwrite a sensor from an untyped string, interpreted according to
    /// the sensor's current kind (numeric sensors must parse as a finite
    /// float).
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] when `raw` does not fit the sensor.
    #[instrument(level = "debug", skip(self))]
    pub fn write_raw(&self, name: &str, raw: &str) -> PotResult<bool> {
        self.write().registry.replace(name, |current| {
            Ok(Sensor {
                value: current.coerce(name, raw)?,
                bounds: current.bounds,
            })
        })
    }

    /// Replace the bounds of a numeric sensor, keeping its reading.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidBounds`] when `min > max` (checked before the lock
    /// is taken), [`PotError::InvalidValue`] for text sensors.
    #[instrument(level = "debug", skip(self))]
    pub fn adjust_bounds(&self, name: &str, min: f64, max: f64) -> PotResult<bool> {
        let bounds = Bounds::new(min, max)?;
        self.write().registry.set_bounds(name, bounds)
    }

    /// Generic read-modify-write of one sensor under the exclusive lock.
    /// `mutate` must not block.
    ///
    /// # Errors
    ///
    /// Whatever `mutate` returns, or [`PotError::InvalidValue`] when its
    /// result changes the sensor's kind.
    pub fn replace_setting<F>(&self, name: &str, mutate: F) -> PotResult<bool>
    where
        F: FnOnce(&Sensor) -> PotResult<Sensor>,
    {
        self.write().registry.replace(name, mutate)
    }

    /// Apply a value and/or new bounds to one sensor in a single critical
    /// section, then evaluate `watch` against the resulting state.
    ///
    /// Returns `Ok(None)` when `name` is absent.
    ///
    /// # Errors
    ///
    /// Any validation failure; nothing is written in that case.
    pub fn update_and_watch(
        &self,
        name: &str,
        value: Option<SensorValue>,
        bounds: Option<Bounds>,
        watch: &[CheckId],
    ) -> PotResult<Option<(Sensor, Vec<(CheckId, Diagnosis)>)>> {
        let mut state = self.write();
        let found = state.registry.replace(name, |current| {
            Ok(Sensor {
                value: value.unwrap_or_else(|| current.value.clone()),
                bounds: bounds.or(current.bounds),
            })
        })?;
        if !found {
            return Ok(None);
        }
        let Some(sensor) = state.registry.get(name).cloned() else {
            return Ok(None);
        };
        let findings = watch
            .iter()
            .map(|&check| (check, diagnostics::evaluate(check, &state.registry, &state.profile)))
            .collect();
        Ok(Some((sensor, findings)))
    }

    /// Evaluate `check` and persist its corrections in one critical section.
    ///
    /// Checks without auto-correct semantics are evaluated read-only and
    /// their diagnosis is returned unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn apply_correction(&self, check: CheckId) -> Diagnosis {
        self.apply_correction_in_context(check).0
    }

    /// [`Gateway::apply_correction`] plus the provisioned-plant flag of the
    /// state it ran against.
    pub fn apply_correction_in_context(&self, check: CheckId) -> (Diagnosis, bool) {
        let mut state = self.write();
        let provisioned = state.profile.is_provisioned();
        let plan = match diagnostics::plan(check, &state.registry) {
            None => {
                let diagnosis = diagnostics::evaluate(check, &state.registry, &state.profile);
                return (diagnosis, provisioned);
            }
            Some(Err(missing)) => return (missing, provisioned),
            Some(Ok(plan)) => plan,
        };

        if let Err(e) = commit(&mut state.registry, &plan) {
            warn!(check = %check, error = %e, "corrections rejected; nothing written");
            return (Diagnosis::Error(e.to_string()), provisioned);
        }
        for correction in &plan.corrections {
            info!(
                check = %check,
                sensor = correction.sensor,
                from = correction.from,
                to = correction.to,
                "correction applied"
            );
        }
        (plan.applied(), provisioned)
    }

    /// Introduce (or re-provision) a sensor.  Setup only.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] for an empty name or invalid record.
    #[instrument(level = "debug", skip(self))]
    pub fn provision(&self, name: &str, sensor: Sensor) -> PotResult<()> {
        self.write().registry.provision(name, sensor)
    }

    /// Replace the plant profile.  [`PlantProfile::empty`] removes the plant.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] when a non-empty profile fails validation.
    pub fn set_profile(&self, profile: PlantProfile) -> PotResult<()> {
        if profile != PlantProfile::empty() {
            profile.validate()?;
        }
        info!(species = %profile.species, "plant profile set");
        self.write().profile = profile;
        Ok(())
    }

    /// Check `name` exists without copying it.
    pub fn contains(&self, name: &str) -> bool {
        self.read().registry.contains(name)
    }

    /// Convenience for adapters that need a hard error for a missing name.
    ///
    /// # Errors
    ///
    /// [`PotError::NotFound`] when `name` is absent.
    pub fn require_setting(&self, name: &str) -> PotResult<Sensor> {
        self.read_setting(name)
            .ok_or_else(|| PotError::NotFound(name.to_string()))
    }
}

/// Write every correction of `plan`, or none of them.
fn commit(registry: &mut SensorRegistry, plan: &diagnostics::CorrectionPlan) -> PotResult<()> {
    let updates: Vec<(&str, SensorValue)> = plan
        .corrections
        .iter()
        .map(|c| (c.sensor, SensorValue::Numeric(c.to)))
        .collect();
    for (name, value) in &updates {
        registry
            .get(name)
            .ok_or_else(|| PotError::NotFound(name.to_string()))?
            .accepts(name, value)?;
    }
    for (name, value) in updates {
        registry.set(name, value)?;
    }
    Ok(())
}
