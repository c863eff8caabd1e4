//! Actuator control loops.

pub mod dispense;

pub use dispense::{DispenseController, DispenseReport, DispenseState};
