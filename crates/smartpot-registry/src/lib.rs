//! `smartpot-registry` – the single source of truth for sensor readings.
//!
//! # Modules
//!
//! - [`registry`] – [`SensorRegistry`][registry::SensorRegistry]: a
//!   name-keyed map of [`Sensor`][smartpot_types::Sensor] records with
//!   get / set / replace semantics.  `set` never creates a sensor; only
//!   `provision` introduces new names.
//! - [`builder`] – [`RegistryBuilder`][builder::RegistryBuilder]: fluent
//!   provisioning helper used at startup and in tests, plus the factory
//!   sensor preset.
//!
//! The registry itself is not synchronised.  It is owned exclusively by the
//! gateway, which serialises every access.

pub mod builder;
pub mod registry;

pub use builder::RegistryBuilder;
pub use registry::SensorRegistry;
