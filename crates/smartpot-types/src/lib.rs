//! `smartpot-types` – shared vocabulary of the SmartPot controller.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`value`] – [`SensorValue`], [`Bounds`] and the [`Sensor`] record held
//!   by the registry.
//! - [`profile`] – the [`PlantProfile`] of the plant housed in the pot.
//! - [`diagnosis`] – [`CheckId`], [`Diagnosis`] and the stable
//!   [`ResultCode`] contract ingress adapters map to transport status.
//! - [`operation`] – the transport-neutral [`Operation`] / [`Reply`] pair
//!   used by the request/response ingress.
//! - [`event`] – the pub/sub [`Event`] envelope and the decoded
//!   [`InboundEvent`].
//! - [`error`] – [`PotError`], the workspace-wide error type.

pub mod diagnosis;
pub mod error;
pub mod event;
pub mod operation;
pub mod profile;
pub mod value;

pub use diagnosis::{CheckId, Diagnosis, ResultCode};
pub use error::{PotError, PotResult};
pub use event::{Event, EventPayload, EventValue, InboundEvent};
pub use operation::{Operation, Reply, ReplyStatus};
pub use profile::PlantProfile;
pub use value::{Bounds, Sensor, SensorValue};
