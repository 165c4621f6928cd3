//! `smartpot-diagnostics` – pure evaluation of the pot's health.
//!
//! Nothing in this crate mutates state.  Every function takes a borrowed
//! [`SensorRegistry`][smartpot_registry::SensorRegistry] and
//! [`PlantProfile`][smartpot_types::PlantProfile] and returns a
//! [`Diagnosis`][smartpot_types::Diagnosis]; the caller decides how long the
//! borrow (and therefore its lock) lives.
//!
//! # Modules
//!
//! - [`checks`] – the individual checks (soil moisture, nutrients,
//!   illumination, critical soil levels, environment, soil compatibility,
//!   summary, plant data) and the sensor names they read.
//! - [`engine`] – [`evaluate`][engine::evaluate] dispatches a
//!   [`CheckId`][smartpot_types::CheckId]; [`plan`][engine::plan] computes
//!   the corrections an "apply" call would persist.

pub mod checks;
pub mod engine;

pub use engine::{checks_watching, evaluate, plan, Correction, CorrectionPlan};
