//! Battery voltage sensing.
//!
//! ## Hardware
//!
//! The pack voltage reaches ADC1 through a resistive divider.  The tick
//! restarts a conversion every eighth tick and hands the finished one to
//! the shared [`AnalogAverager`], so a new average is committed every
//! 64 × 8 × 2.5 ms ≈ 1.3 s while the chip is awake.
//!
//! ## Calibration
//!
//! The divider ratio is folded into the user-editable calibration constant
//! (750–850, factory 799, i.e. a ratio of 7.99):
//!
//! ```text
//!   mV = raw × ref_mV / full_scale × calibration / 100
//! ```

use crate::config::FeederConfig;

/// Samples summed before an average is committed.
pub const SAMPLES_PER_AVERAGE: u16 = 64;

/// Sliding-block averager: sums 64 samples, commits `sum / 64`, restarts.
#[derive(Debug, Clone, Copy)]
pub struct AnalogAverager {
    sum: u32,
    count: u16,
    committed: u16,
}

impl AnalogAverager {
    pub const fn new() -> Self {
        Self {
            sum: 0,
            count: 0,
            committed: 0,
        }
    }

    pub fn update(&mut self, sample: u16) {
        self.sum += sample as u32;
        self.count += 1;
        if self.count >= SAMPLES_PER_AVERAGE {
            self.committed = (self.sum / SAMPLES_PER_AVERAGE as u32) as u16;
            self.sum = 0;
            self.count = 0;
        }
    }

    /// Last committed average; 0 until the first block completes.
    pub fn get(&self) -> u16 {
        self.committed
    }
}

impl Default for AnalogAverager {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a raw averaged reading to pack millivolts.
pub fn battery_millivolts(raw: u16, calibration: u16, config: &FeederConfig) -> u32 {
    let full_scale = config.adc_full_scale.max(1);
    let pin_mv = raw as u32 * config.adc_reference_mv / full_scale;
    pin_mv * calibration as u32 / 100
}

/// `true` when a committed reading is below the alert threshold.
///
/// A zero reading means no block has completed since power-up and is
/// never reported as low.
pub fn is_low(raw: u16, calibration: u16, config: &FeederConfig) -> bool {
    raw != 0 && battery_millivolts(raw, calibration, config) < config.low_battery_mv as u32
}
