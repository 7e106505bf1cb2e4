//! ESPFAN firmware library.
//!
//! Exposes the fan-control core, the port traits and both adapter
//! families for the binary and for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; other targets get the simulation adapters.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod pins;
pub mod sensors;

pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
