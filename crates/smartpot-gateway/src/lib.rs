//! `smartpot-gateway` – the synchronisation boundary.
//!
//! Both ingress paths (request/response and publish/subscribe) share one
//! [`Gateway`] through an `Arc`.  It is the only owner of the sensor
//! registry and the plant profile, and the only code that mutates them.
//!
//! # Modules
//!
//! - [`gateway`] – [`Gateway`][gateway::Gateway]: a single reader/writer lock
//!   over [`PotState`][gateway::PotState].  Every multi-step operation
//!   (bounds adjustment, multi-sensor diagnostics, corrections) runs under
//!   one guard, and every result is copied out before the guard drops.
//! - [`dispatch`] – maps transport-neutral
//!   [`Operation`][smartpot_types::Operation]s and decoded
//!   [`InboundEvent`][smartpot_types::InboundEvent]s onto gateway calls.

pub mod dispatch;
pub mod gateway;

pub use gateway::{Gateway, PotState};
