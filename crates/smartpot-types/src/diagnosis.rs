//! Diagnostic identifiers and results.
//!
//! Every check produces a [`Diagnosis`] whose [`ResultCode`] is the stable,
//! machine-checkable part of the contract; the message wording is free to
//! change.  On the wire a diagnosis is rendered as `"<code>%<message>"`,
//! e.g. `1%Soil Type not suitable for plant!`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PotError, PotResult};

/// Tri-state outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum ResultCode {
    Error = -1,
    Ok = 0,
    Alert = 1,
}

impl ResultCode {
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn from_i8(code: i8) -> Option<Self> {
        match code {
            -1 => Some(ResultCode::Error),
            0 => Some(ResultCode::Ok),
            1 => Some(ResultCode::Alert),
            _ => None,
        }
    }
}

/// Result of evaluating one diagnostic check.
///
/// `Ok` carries an optional effect message ("Nutrients injected: …"); an
/// empty string means nothing to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "message")]
pub enum Diagnosis {
    Error(String),
    Ok(String),
    Alert(String),
}

impl Diagnosis {
    pub fn ok() -> Self {
        Diagnosis::Ok(String::new())
    }

    pub fn code(&self) -> ResultCode {
        match self {
            Diagnosis::Error(_) => ResultCode::Error,
            Diagnosis::Ok(_) => ResultCode::Ok,
            Diagnosis::Alert(_) => ResultCode::Alert,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Diagnosis::Error(m) | Diagnosis::Ok(m) | Diagnosis::Alert(m) => m,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Diagnosis::Alert(_))
    }

    /// Render as `"<code>%<message>"`.
    pub fn to_wire(&self) -> String {
        format!("{}%{}", self.code().as_i8(), self.message())
    }

    /// Parse the `"<code>%<message>"` form.
    ///
    /// # Errors
    ///
    /// [`PotError::Decode`] when the separator is missing or the code is not
    /// one of `-1`, `0`, `1`.
    pub fn from_wire(raw: &str) -> PotResult<Self> {
        let (code, message) = raw
            .split_once('%')
            .ok_or_else(|| PotError::Decode(format!("missing '%' separator in '{raw}'")))?;
        let code = code
            .trim()
            .parse::<i8>()
            .ok()
            .and_then(ResultCode::from_i8)
            .ok_or_else(|| PotError::Decode(format!("unknown result code '{code}'")))?;
        let message = message.to_string();
        Ok(match code {
            ResultCode::Error => Diagnosis::Error(message),
            ResultCode::Ok => Diagnosis::Ok(message),
            ResultCode::Alert => Diagnosis::Alert(message),
        })
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// The fixed set of diagnostic checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckId {
    SoilMoisture,
    Nutrients,
    Illumination,
    CriticalSoilLevels,
    Environment,
    SoilCompatibility,
    Summary,
    PlantData,
}

impl CheckId {
    pub const ALL: [CheckId; 8] = [
        CheckId::SoilMoisture,
        CheckId::Nutrients,
        CheckId::Illumination,
        CheckId::CriticalSoilLevels,
        CheckId::Environment,
        CheckId::SoilCompatibility,
        CheckId::Summary,
        CheckId::PlantData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckId::SoilMoisture => "soil-moisture",
            CheckId::Nutrients => "nutrients",
            CheckId::Illumination => "illumination",
            CheckId::CriticalSoilLevels => "critical-soil-levels",
            CheckId::Environment => "environment",
            CheckId::SoilCompatibility => "soil-compatibility",
            CheckId::Summary => "summary",
            CheckId::PlantData => "plant-data",
        }
    }

    /// Checks that can persist a correction through an "apply" call.
    pub fn auto_corrects(self) -> bool {
        matches!(
            self,
            CheckId::SoilMoisture | CheckId::Nutrients | CheckId::Illumination
        )
    }

    /// Checks that report `Error` when no plant is provisioned.
    pub fn requires_profile(self) -> bool {
        matches!(
            self,
            CheckId::SoilCompatibility | CheckId::Summary | CheckId::PlantData
        )
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckId {
    type Err = PotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PotError::NotFound(format!("diagnostic check '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_are_stable() {
        assert_eq!(ResultCode::Error.as_i8(), -1);
        assert_eq!(ResultCode::Ok.as_i8(), 0);
        assert_eq!(ResultCode::Alert.as_i8(), 1);
        assert_eq!(ResultCode::from_i8(2), None);
    }

    #[test]
    fn wire_form_matches_device_format() {
        assert_eq!(Diagnosis::ok().to_wire(), "0%");
        assert_eq!(
            Diagnosis::Error("No plant found!".into()).to_wire(),
            "-1%No plant found!"
        );
        assert_eq!(
            Diagnosis::Alert("Soil Type not suitable for plant!".into()).to_string(),
            "1%Soil Type not suitable for plant!"
        );
    }

    #[test]
    fn from_wire_keeps_percent_signs_in_message() {
        let d = Diagnosis::from_wire("1%humidity at 120% of max").unwrap();
        assert_eq!(d, Diagnosis::Alert("humidity at 120% of max".into()));
    }

    #[test]
    fn from_wire_rejects_garbage() {
        assert!(matches!(Diagnosis::from_wire("nope"), Err(PotError::Decode(_))));
        assert!(matches!(Diagnosis::from_wire("7%x"), Err(PotError::Decode(_))));
    }

    #[test]
    fn check_id_parses_its_own_name() {
        for id in CheckId::ALL {
            assert_eq!(id.as_str().parse::<CheckId>().unwrap(), id);
        }
        assert!(matches!(
            "weather".parse::<CheckId>(),
            Err(PotError::NotFound(_))
        ));
    }

    #[test]
    fn check_id_serde_uses_kebab_case() {
        let json = serde_json::to_string(&CheckId::CriticalSoilLevels).unwrap();
        assert_eq!(json, "\"critical-soil-levels\"");
    }
}
