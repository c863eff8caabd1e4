//! PetFeeder firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod menu;
pub mod power;
pub mod scheduler;
pub mod settings;
pub mod tick;

mod pins;

// The ESP-IDF-only parts of these compile to simulation stubs on the host.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;
