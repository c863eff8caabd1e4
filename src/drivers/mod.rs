//! Peripheral drivers, hardware initialisation, and the tick timer.

pub mod button;
pub mod ds1302;
pub mod hw_init;
pub mod hw_timer;
pub mod melody;
pub mod servo;
pub mod seven_segment;
pub mod watchdog;
