//! The fixed set of diagnostic checks.
//!
//! Each check names the sensors it requires.  A missing required sensor is
//! always an `Error`, never a default; a reading strictly outside its bounds
//! is an `Alert`; anything else is `Ok`.  When several conditions trigger,
//! messages are joined in the order the sensors are listed.

use smartpot_registry::SensorRegistry;
use smartpot_types::{Diagnosis, PlantProfile, Sensor};

use crate::engine::Correction;

pub const SOIL_HUMIDITY: &str = "soilHumidity";
pub const SOIL_PH: &str = "soilPh";
pub const SOIL_TYPE: &str = "soilType";
pub const LUMINOSITY: &str = "luminosity";
pub const TEMPERATURE: &str = "temperature";
pub const HUMIDITY: &str = "humidity";
pub const PHOSPHORUS: &str = "phosphorus";
pub const NITROGEN: &str = "nitrogen";
pub const POTASSIUM: &str = "potassium";

/// Nutrients in reporting order.
pub const NUTRIENTS: [&str; 3] = [PHOSPHORUS, NITROGEN, POTASSIUM];

const SOIL_LEVELS: [(&str, &str); 2] = [(SOIL_PH, "soilPh"), (SOIL_HUMIDITY, "soil humidity")];
const ENVIRONMENT: [(&str, &str); 2] = [(TEMPERATURE, "temperature"), (HUMIDITY, "humidity")];

pub const NO_PLANT: &str = "No plant found!";

/// Fetch a sensor that must exist and hold a number.
pub(crate) fn numeric<'a>(registry: &'a SensorRegistry, name: &str) -> Result<&'a Sensor, Diagnosis> {
    let sensor = registry
        .get(name)
        .ok_or_else(|| Diagnosis::Error(format!("No {name} sensor found!")))?;
    match sensor.as_numeric() {
        Some(_) => Ok(sensor),
        None => Err(Diagnosis::Error(format!("{name} sensor is not numeric!"))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auto-correcting checks: produce the corrections, the engine phrases them.
// ────────────────────────────────────────────────────────────────────────────

/// Soil too dry → raise `soilHumidity` to its upper bound.
pub(crate) fn soil_moisture(registry: &SensorRegistry) -> Result<Vec<Correction>, Diagnosis> {
    let sensor = numeric(registry, SOIL_HUMIDITY)?;
    Ok(raise_to(SOIL_HUMIDITY, sensor, |b| b.max()).into_iter().collect())
}

/// Every nutrient under its lower bound is topped up to its upper bound.
/// All three nutrient sensors are required.
pub(crate) fn nutrients(registry: &SensorRegistry) -> Result<Vec<Correction>, Diagnosis> {
    let sensors = NUTRIENTS
        .iter()
        .map(|name| numeric(registry, name).map(|s| (*name, s)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sensors
        .into_iter()
        .filter_map(|(name, sensor)| raise_to(name, sensor, |b| b.max()))
        .collect())
}

/// Too dark → raise `luminosity` to the middle of its range.
pub(crate) fn illumination(registry: &SensorRegistry) -> Result<Vec<Correction>, Diagnosis> {
    let sensor = numeric(registry, LUMINOSITY)?;
    Ok(raise_to(LUMINOSITY, sensor, |b| b.midpoint()).into_iter().collect())
}

fn raise_to(
    name: &'static str,
    sensor: &Sensor,
    target: impl Fn(&smartpot_types::Bounds) -> f64,
) -> Option<Correction> {
    if !sensor.is_below_min() {
        return None;
    }
    let bounds = sensor.bounds?;
    Some(Correction {
        sensor: name,
        from: sensor.as_numeric()?,
        to: target(&bounds),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Alerting checks
// ────────────────────────────────────────────────────────────────────────────

pub fn critical_soil_levels(registry: &SensorRegistry) -> Diagnosis {
    range_alerts(registry, &SOIL_LEVELS)
}

pub fn environment(registry: &SensorRegistry) -> Diagnosis {
    range_alerts(registry, &ENVIRONMENT)
}

/// Alert for every listed sensor strictly outside its bounds, low before
/// high, sensors in list order.  All sensors must exist before any is
/// judged.
fn range_alerts(registry: &SensorRegistry, watched: &[(&str, &str)]) -> Diagnosis {
    let mut sensors = Vec::with_capacity(watched.len());
    for (name, label) in watched {
        match numeric(registry, name) {
            Ok(sensor) => sensors.push((*label, sensor)),
            Err(missing) => return missing,
        }
    }

    let mut alerts = Vec::new();
    for (label, sensor) in sensors {
        if sensor.is_below_min() {
            alerts.push(format!("{label} under critical levels!"));
        } else if sensor.is_above_max() {
            alerts.push(format!("{label} above critical levels!"));
        }
    }

    if alerts.is_empty() {
        Diagnosis::ok()
    } else {
        Diagnosis::Alert(alerts.join(" "))
    }
}

pub fn soil_compatibility(registry: &SensorRegistry, profile: &PlantProfile) -> Diagnosis {
    if !profile.is_provisioned() {
        return Diagnosis::Error(NO_PLANT.to_string());
    }
    let Some(sensor) = registry.get(SOIL_TYPE) else {
        return Diagnosis::Error(format!("No {SOIL_TYPE} sensor found!"));
    };
    match sensor.as_text() {
        Some(soil) if soil == profile.compatible_soil => Diagnosis::ok(),
        Some(_) => Diagnosis::Alert("Soil Type not suitable for plant!".to_string()),
        None => Diagnosis::Error(format!("{SOIL_TYPE} sensor is not textual!")),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reports
// ────────────────────────────────────────────────────────────────────────────

pub fn plant_data(profile: &PlantProfile) -> Diagnosis {
    if !profile.is_provisioned() {
        return Diagnosis::Error(NO_PLANT.to_string());
    }
    Diagnosis::Ok(describe_plant(profile))
}

/// Profile fields followed by every registered sensor in registry order.
pub fn summary(registry: &SensorRegistry, profile: &PlantProfile) -> Diagnosis {
    if !profile.is_provisioned() {
        return Diagnosis::Error(NO_PLANT.to_string());
    }
    let mut out = describe_plant(profile);
    out.push_str(&format!("\nCompatible soil: {}", profile.compatible_soil));
    for (name, sensor) in registry.iter() {
        out.push_str(&format!("\n{name}: {}", sensor.value));
    }
    Diagnosis::Ok(out)
}

fn describe_plant(profile: &PlantProfile) -> String {
    format!(
        "Plant species: {}\nPlant color: {}\nPlant height: {}\nPlant type: {}",
        profile.species, profile.color, profile.height, profile.plant_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpot_registry::RegistryBuilder;
    use smartpot_types::ResultCode;

    fn cactus() -> PlantProfile {
        PlantProfile::new("Cactus", "Green", 1.3, "Desert", "Red").unwrap()
    }

    #[test]
    fn critical_soil_levels_reports_both_in_order() {
        let registry = RegistryBuilder::new()
            .with_bounded(SOIL_PH, 2.0, 3.0, 3.0)
            .with_bounded(SOIL_HUMIDITY, 2.0, 3.0, 6.0)
            .build()
            .unwrap();
        let d = critical_soil_levels(&registry);
        assert_eq!(d.code(), ResultCode::Alert);
        let msg = d.message();
        let ph = msg.find("soilPh under critical levels").expect("ph alert");
        let hum = msg
            .find("soil humidity under critical levels")
            .expect("humidity alert");
        assert!(ph < hum, "soilPh must be reported before soil humidity");
    }

    #[test]
    fn critical_soil_levels_low_ph_and_high_humidity() {
        let registry = RegistryBuilder::new()
            .with_bounded(SOIL_PH, 1.0, 3.0, 7.0)
            .with_bounded(SOIL_HUMIDITY, 9.0, 3.0, 6.0)
            .build()
            .unwrap();
        assert_eq!(
            critical_soil_levels(&registry),
            Diagnosis::Alert(
                "soilPh under critical levels! soil humidity above critical levels!".into()
            )
        );
    }

    #[test]
    fn values_on_the_bound_are_ok() {
        let registry = RegistryBuilder::new()
            .with_bounded(SOIL_PH, 3.0, 3.0, 3.0)
            .with_bounded(SOIL_HUMIDITY, 6.0, 3.0, 6.0)
            .build()
            .unwrap();
        assert_eq!(critical_soil_levels(&registry), Diagnosis::ok());
    }

    #[test]
    fn missing_sensor_is_error_not_default() {
        let registry = RegistryBuilder::new()
            .with_bounded(SOIL_HUMIDITY, 2.0, 3.0, 6.0)
            .build()
            .unwrap();
        assert_eq!(
            critical_soil_levels(&registry),
            Diagnosis::Error("No soilPh sensor found!".into())
        );
    }

    #[test]
    fn environment_high_temperature() {
        let registry = RegistryBuilder::new()
            .with_bounded(TEMPERATURE, 40.0, 10.0, 30.0)
            .with_bounded(HUMIDITY, 50.0, 30.0, 70.0)
            .build()
            .unwrap();
        assert_eq!(
            environment(&registry),
            Diagnosis::Alert("temperature above critical levels!".into())
        );
    }

    #[test]
    fn environment_requires_humidity() {
        let registry = RegistryBuilder::new()
            .with_bounded(TEMPERATURE, 20.0, 10.0, 30.0)
            .build()
            .unwrap();
        assert_eq!(environment(&registry).code(), ResultCode::Error);
    }

    #[test]
    fn text_where_number_required_is_error() {
        let registry = RegistryBuilder::new()
            .with_text(TEMPERATURE, "warm")
            .with_numeric(HUMIDITY, 50.0)
            .build()
            .unwrap();
        assert_eq!(
            environment(&registry),
            Diagnosis::Error("temperature sensor is not numeric!".into())
        );
    }

    #[test]
    fn soil_compatibility_mismatch_alerts() {
        let registry = RegistryBuilder::new()
            .with_text(SOIL_TYPE, "Black")
            .build()
            .unwrap();
        assert_eq!(
            soil_compatibility(&registry, &cactus()),
            Diagnosis::Alert("Soil Type not suitable for plant!".into())
        );
    }

    #[test]
    fn soil_compatibility_match_is_ok() {
        let registry = RegistryBuilder::new()
            .with_text(SOIL_TYPE, "Red")
            .build()
            .unwrap();
        assert_eq!(soil_compatibility(&registry, &cactus()), Diagnosis::ok());
    }

    #[test]
    fn soil_compatibility_without_plant() {
        let registry = RegistryBuilder::new()
            .with_text(SOIL_TYPE, "Red")
            .build()
            .unwrap();
        assert_eq!(
            soil_compatibility(&registry, &PlantProfile::empty()),
            Diagnosis::Error(NO_PLANT.into())
        );
    }

    #[test]
    fn soil_compatibility_without_sensor() {
        let registry = SensorRegistry::new();
        assert_eq!(
            soil_compatibility(&registry, &cactus()).code(),
            ResultCode::Error
        );
    }

    #[test]
    fn summary_lists_profile_then_sensors() {
        let registry = RegistryBuilder::new()
            .with_text(SOIL_TYPE, "Red")
            .with_bounded(HUMIDITY, 3.5, 3.0, 3.0)
            .build()
            .unwrap();
        let d = summary(&registry, &cactus());
        assert_eq!(
            d.message(),
            "Plant species: Cactus\nPlant color: Green\nPlant height: 1.3\n\
             Plant type: Desert\nCompatible soil: Red\nhumidity: 3.5\nsoilType: Red"
        );
    }

    #[test]
    fn reports_require_a_plant() {
        let registry = SensorRegistry::new();
        assert_eq!(
            summary(&registry, &PlantProfile::empty()),
            Diagnosis::Error(NO_PLANT.into())
        );
        assert_eq!(
            plant_data(&PlantProfile::empty()),
            Diagnosis::Error(NO_PLANT.into())
        );
    }

    #[test]
    fn nutrients_skip_sensors_within_bounds() {
        let registry = RegistryBuilder::new()
            .with_bounded(PHOSPHORUS, 1.0, 2.0, 4.0)
            .with_bounded(NITROGEN, 5.0, 2.0, 6.0)
            .with_bounded(POTASSIUM, 1.0, 3.0, 8.0)
            .build()
            .unwrap();
        let corrections = nutrients(&registry).unwrap();
        let names: Vec<_> = corrections.iter().map(|c| c.sensor).collect();
        assert_eq!(names, vec![PHOSPHORUS, POTASSIUM]);
        assert_eq!(corrections[1].to, 8.0);
    }
}
