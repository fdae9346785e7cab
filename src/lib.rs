//! GridGuard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod safety;
pub mod sensors;
pub mod telemetry;

pub mod pins;

// Hardware-facing modules; the real implementations are guarded by cfg
// attributes inside and fall back to in-memory simulation on host.
pub mod adapters;
pub mod drivers;

mod esp_link_shims;
