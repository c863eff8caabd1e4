//! Dispense wheel position sensor.
//!
//! A slotted disc on the wheel shaft passes an optical interrupter; the
//! output goes HIGH each time a slot lines up, i.e. once per completed step.
//! The tick samples the pin and latches rising edges; the dispense
//! controller consumes them.

use core::sync::atomic::{AtomicBool, Ordering};

/// Rising-edge latch shared between the tick (writer) and the main loop.
pub struct EdgeLatch {
    last: AtomicBool,
    edge: AtomicBool,
}

impl EdgeLatch {
    pub const fn new() -> Self {
        Self {
            last: AtomicBool::new(false),
            edge: AtomicBool::new(false),
        }
    }

    /// Feed one sample.  Tick context only.
    pub fn update(&self, level: bool) {
        let previous = self.last.swap(level, Ordering::Relaxed);
        if level && !previous {
            self.edge.store(true, Ordering::Release);
        }
    }

    /// Consume a latched edge.
    pub fn take(&self) -> bool {
        self.edge.swap(false, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.edge.store(false, Ordering::Release);
    }
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}
