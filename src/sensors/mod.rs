//! Sensor subsystem.
//!
//! Both sensors are sampled from the tick, not polled by the main loop:
//! the battery divider through the ADC averager, the wheel position sensor
//! through an edge latch.

pub mod battery;
pub mod position;

pub use battery::AnalogAverager;
pub use position::EdgeLatch;
