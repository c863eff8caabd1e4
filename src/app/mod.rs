//! Application core: the event loop and its port boundary.
//!
//! The business rules (power modes, scheduling, dispensing, the menu) live
//! in their own modules; this layer wires them into the wake cycle.  All
//! interaction with hardware happens through the **port traits** defined
//! in [`ports`], keeping the loop testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
