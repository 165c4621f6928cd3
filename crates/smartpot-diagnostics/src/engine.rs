//! Check dispatch and correction planning.
//!
//! [`evaluate`] is read-only: for the auto-correcting checks (soil moisture,
//! nutrients, illumination) it reports what *would* change.  Persisting a
//! correction is the gateway's job; it calls [`plan`] under its exclusive
//! lock, writes every [`Correction`] and reports
//! [`CorrectionPlan::applied`].

use smartpot_registry::SensorRegistry;
use smartpot_types::{CheckId, Diagnosis, PlantProfile};
use tracing::debug;

use crate::checks;

/// One numeric write an auto-correcting check asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub sensor: &'static str,
    pub from: f64,
    pub to: f64,
}

/// The corrections a check would persist, empty when nothing is out of
/// range.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionPlan {
    pub check: CheckId,
    pub corrections: Vec<Correction>,
}

impl CorrectionPlan {
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    /// Read-only phrasing: what applying the plan would do.
    pub fn pending(&self) -> Diagnosis {
        self.describe(false)
    }

    /// Past-tense phrasing, used once the corrections are written.
    pub fn applied(&self) -> Diagnosis {
        self.describe(true)
    }

    fn describe(&self, applied: bool) -> Diagnosis {
        let Some(first) = self.corrections.first() else {
            return Diagnosis::ok();
        };
        let message = match (self.check, applied) {
            (CheckId::SoilMoisture, false) => {
                format!("Soil needs moistening, soil humidity would be raised to: {}", first.to)
            }
            (CheckId::SoilMoisture, true) => {
                format!("Soil has been moistened, current soil humidity: {}", first.to)
            }
            (CheckId::Illumination, false) => {
                format!("Luminosity would be increased to: {}", first.to)
            }
            (CheckId::Illumination, true) => {
                format!("Luminosity has been increased to: {}", first.to)
            }
            (_, applied) => {
                let names: Vec<_> = self.corrections.iter().map(|c| c.sensor).collect();
                let verb = if applied { "Nutrients injected" } else { "Nutrients to inject" };
                format!("{verb}: {}", names.join(", "))
            }
        };
        Diagnosis::Ok(message)
    }
}

/// Evaluate `check` against one consistent view of the registry and profile.
pub fn evaluate(check: CheckId, registry: &SensorRegistry, profile: &PlantProfile) -> Diagnosis {
    let diagnosis = match check {
        CheckId::SoilMoisture | CheckId::Nutrients | CheckId::Illumination => {
            match plan(check, registry) {
                Some(Ok(plan)) => plan.pending(),
                Some(Err(error)) => error,
                None => Diagnosis::ok(),
            }
        }
        CheckId::CriticalSoilLevels => checks::critical_soil_levels(registry),
        CheckId::Environment => checks::environment(registry),
        CheckId::SoilCompatibility => checks::soil_compatibility(registry, profile),
        CheckId::Summary => checks::summary(registry, profile),
        CheckId::PlantData => checks::plant_data(profile),
    };
    debug!(check = %check, code = ?diagnosis.code(), "check evaluated");
    diagnosis
}

/// Corrections an auto-correcting check would persist.
///
/// Returns `None` for checks without auto-correct semantics, and
/// `Some(Err(diagnosis))` when a required sensor is missing.
pub fn plan(check: CheckId, registry: &SensorRegistry) -> Option<Result<CorrectionPlan, Diagnosis>> {
    let corrections = match check {
        CheckId::SoilMoisture => checks::soil_moisture(registry),
        CheckId::Nutrients => checks::nutrients(registry),
        CheckId::Illumination => checks::illumination(registry),
        _ => return None,
    };
    match &corrections {
        Ok(list) => debug!(check = %check, corrections = list.len(), "corrections planned"),
        Err(missing) => debug!(check = %check, detail = missing.message(), "cannot plan corrections"),
    }
    Some(corrections.map(|corrections| CorrectionPlan { check, corrections }))
}

/// Alerting checks whose outcome can change when `sensor` is written.
pub fn checks_watching(sensor: &str) -> &'static [CheckId] {
    match sensor {
        checks::SOIL_PH | checks::SOIL_HUMIDITY => &[CheckId::CriticalSoilLevels],
        checks::TEMPERATURE | checks::HUMIDITY => &[CheckId::Environment],
        checks::SOIL_TYPE => &[CheckId::SoilCompatibility],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpot_registry::RegistryBuilder;
    use smartpot_types::ResultCode;

    use crate::checks::{LUMINOSITY, NITROGEN, PHOSPHORUS, POTASSIUM, SOIL_HUMIDITY};

    fn cactus() -> PlantProfile {
        PlantProfile::new("Cactus", "Green", 1.3, "Desert", "Red").unwrap()
    }

    #[test]
    fn nutrient_injection_lists_low_nutrients_in_order() {
        let registry = RegistryBuilder::new()
            .with_bounded(POTASSIUM, 1.0, 3.0, 5.0)
            .with_bounded(NITROGEN, 5.0, 2.0, 6.0)
            .with_bounded(PHOSPHORUS, 1.0, 2.0, 4.0)
            .build()
            .unwrap();
        let d = evaluate(CheckId::Nutrients, &registry, &PlantProfile::empty());
        assert_eq!(d.code(), ResultCode::Ok);
        assert!(d.message().contains("phosphorus, potassium"), "{d}");
        assert!(!d.message().contains("nitrogen"));
    }

    #[test]
    fn nutrients_all_fine_is_silent_ok() {
        let registry = RegistryBuilder::new()
            .with_bounded(PHOSPHORUS, 3.0, 2.0, 4.0)
            .with_bounded(NITROGEN, 3.0, 2.0, 4.0)
            .with_bounded(POTASSIUM, 3.0, 2.0, 4.0)
            .build()
            .unwrap();
        assert_eq!(
            evaluate(CheckId::Nutrients, &registry, &PlantProfile::empty()),
            Diagnosis::ok()
        );
    }

    #[test]
    fn nutrients_missing_one_is_error() {
        let registry = RegistryBuilder::new()
            .with_bounded(PHOSPHORUS, 3.0, 2.0, 4.0)
            .with_bounded(POTASSIUM, 3.0, 2.0, 4.0)
            .build()
            .unwrap();
        assert_eq!(
            evaluate(CheckId::Nutrients, &registry, &PlantProfile::empty()),
            Diagnosis::Error("No nitrogen sensor found!".into())
        );
    }

    #[test]
    fn moisture_reports_raise_to_max() {
        let registry = RegistryBuilder::new()
            .with_bounded(SOIL_HUMIDITY, 2.0, 3.0, 6.0)
            .build()
            .unwrap();
        let d = evaluate(CheckId::SoilMoisture, &registry, &PlantProfile::empty());
        assert_eq!(d.code(), ResultCode::Ok);
        assert!(d.message().ends_with("raised to: 6"), "{d}");

        let plan = plan(CheckId::SoilMoisture, &registry).unwrap().unwrap();
        assert_eq!(
            plan.corrections,
            vec![Correction { sensor: SOIL_HUMIDITY, from: 2.0, to: 6.0 }]
        );
        assert_eq!(
            plan.applied().message(),
            "Soil has been moistened, current soil humidity: 6"
        );
    }

    #[test]
    fn moisture_missing_sensor_is_error() {
        let registry = SensorRegistry::new();
        assert_eq!(
            evaluate(CheckId::SoilMoisture, &registry, &PlantProfile::empty()),
            Diagnosis::Error("No soilHumidity sensor found!".into())
        );
    }

    #[test]
    fn illumination_targets_midpoint() {
        let registry = RegistryBuilder::new()
            .with_bounded(LUMINOSITY, 2.0, 4.0, 5.0)
            .build()
            .unwrap();
        let plan = plan(CheckId::Illumination, &registry).unwrap().unwrap();
        assert_eq!(plan.corrections[0].to, 4.5);
        assert_eq!(
            plan.pending().message(),
            "Luminosity would be increased to: 4.5"
        );
    }

    #[test]
    fn illumination_bright_enough_is_ok() {
        let registry = RegistryBuilder::new()
            .with_bounded(LUMINOSITY, 4.0, 4.0, 5.0)
            .build()
            .unwrap();
        assert!(plan(CheckId::Illumination, &registry).unwrap().unwrap().is_empty());
    }

    #[test]
    fn evaluate_is_deterministic() {
        let registry = RegistryBuilder::factory_preset().build().unwrap();
        for check in CheckId::ALL {
            let first = evaluate(check, &registry, &cactus());
            let second = evaluate(check, &registry, &cactus());
            assert_eq!(first, second, "{check} must be idempotent");
        }
    }

    #[test]
    fn plan_is_none_for_alerting_checks() {
        let registry = RegistryBuilder::factory_preset().build().unwrap();
        assert!(plan(CheckId::Environment, &registry).is_none());
        assert!(plan(CheckId::Summary, &registry).is_none());
    }

    #[test]
    fn watchers() {
        assert_eq!(checks_watching("soilPh"), &[CheckId::CriticalSoilLevels]);
        assert_eq!(checks_watching("humidity"), &[CheckId::Environment]);
        assert!(checks_watching("nitrogen").is_empty());
    }
}
