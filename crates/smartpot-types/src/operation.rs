//! Transport-neutral request/response contract.
//!
//! The request/response ingress turns each inbound call into an
//! [`Operation`], hands it to the gateway, and maps the returned [`Reply`]
//! onto its own status vocabulary.  [`ReplyStatus`] keeps NotFound,
//! InvalidValue and MissingProfile distinguishable so an adapter never has to
//! interpret message wording.

use serde::{Deserialize, Serialize};

use crate::diagnosis::{CheckId, Diagnosis, ResultCode};
use crate::error::PotError;

/// One gateway call as issued by an ingress adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Liveness check; touches no state.
    Ping,
    ReadSetting { name: String },
    ListSettings,
    /// `raw` is interpreted according to the target sensor's kind.
    WriteSetting { name: String, raw: String },
    AdjustBounds { name: String, min: f64, max: f64 },
    RunDiagnostic { check: CheckId },
    ApplyCorrection { check: CheckId },
    ReadProfile,
}

/// Outcome category an adapter maps to a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Ok,
    Alert,
    NotFound,
    InvalidValue,
    MissingProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub status: ReplyStatus,
    pub code: ResultCode,
    pub message: String,
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Ok,
            code: ResultCode::Ok,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::NotFound,
            code: ResultCode::Error,
            message: message.into(),
        }
    }

    /// Map a diagnosis.  `missing_profile` tells an `Error` caused by an
    /// absent plant apart from one caused by an absent sensor.
    pub fn from_diagnosis(diagnosis: &Diagnosis, missing_profile: bool) -> Self {
        let status = match diagnosis {
            Diagnosis::Ok(_) => ReplyStatus::Ok,
            Diagnosis::Alert(_) => ReplyStatus::Alert,
            Diagnosis::Error(_) if missing_profile => ReplyStatus::MissingProfile,
            Diagnosis::Error(_) => ReplyStatus::NotFound,
        };
        Self {
            status,
            code: diagnosis.code(),
            message: diagnosis.message().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ReplyStatus::Ok | ReplyStatus::Alert)
    }
}

impl From<&PotError> for Reply {
    fn from(err: &PotError) -> Self {
        let status = match err {
            PotError::NotFound(_) => ReplyStatus::NotFound,
            PotError::MissingProfile => ReplyStatus::MissingProfile,
            PotError::InvalidValue { .. }
            | PotError::InvalidBounds { .. }
            | PotError::Decode(_)
            | PotError::Transport(_)
            | PotError::Config(_) => ReplyStatus::InvalidValue,
        };
        Self {
            status,
            code: ResultCode::Error,
            message: err.to_string(),
        }
    }
}
