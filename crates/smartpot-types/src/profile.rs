use serde::{Deserialize, Serialize};

use crate::error::{PotError, PotResult};

/// Static description of the plant currently housed in the pot.
///
/// [`PlantProfile::default`] is the *empty* profile and stands for "no plant
/// provisioned".  Any profile whose `species` is not blank is provisioned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantProfile {
    pub species: String,
    pub color: String,
    pub height: f64,
    pub plant_type: String,
    pub compatible_soil: String,
}

impl PlantProfile {
    /// Build a provisioned profile.
    ///
    /// # Errors
    ///
    /// [`PotError::InvalidValue`] when `species` is empty or `height` is
    /// negative / not finite.
    pub fn new(
        species: impl Into<String>,
        color: impl Into<String>,
        height: f64,
        plant_type: impl Into<String>,
        compatible_soil: impl Into<String>,
    ) -> PotResult<Self> {
        let profile = Self {
            species: species.into(),
            color: color.into(),
            height,
            plant_type: plant_type.into(),
            compatible_soil: compatible_soil.into(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// The "no plant" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Same rule as [`PlantProfile::validate`]: a blank species is no plant.
    pub fn is_provisioned(&self) -> bool {
        !self.species.trim().is_empty()
    }

    /// # Errors
    ///
    /// [`PotError::InvalidValue`] for an empty species or a bad height.
    pub fn validate(&self) -> PotResult<()> {
        if self.species.trim().is_empty() {
            return Err(PotError::invalid("plant.species", "species must not be empty"));
        }
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(PotError::invalid(
                "plant.height",
                format!("{} is not a valid height", self.height),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cactus() -> PlantProfile {
        PlantProfile::new("Cactus", "Green", 1.3, "Desert", "Red").unwrap()
    }

    #[test]
    fn empty_profile_equals_itself() {
        assert_eq!(PlantProfile::empty(), PlantProfile::default());
        assert!(!PlantProfile::empty().is_provisioned());
    }

    #[test]
    fn empty_profile_differs_from_provisioned() {
        assert_ne!(PlantProfile::empty(), cactus());
        assert!(cactus().is_provisioned());
    }

    #[test]
    fn negative_height_rejected() {
        assert!(PlantProfile::new("Fern", "Green", -0.1, "Shade", "Black").is_err());
    }

    #[test]
    fn blank_species_is_not_provisioned() {
        let blank = PlantProfile {
            species: "   ".into(),
            ..cactus()
        };
        assert!(!blank.is_provisioned());
        assert!(blank.validate().is_err());
    }

    #[test]
    fn blank_species_rejected() {
        assert!(PlantProfile::new("  ", "Green", 1.0, "Shade", "Black").is_err());
    }
}
