//! System configuration parameters
//!
//! Build-time tunables for the feeder.  These are not user-editable; the
//! only persisted settings are the feeding schedule and the battery
//! calibration (see [`crate::settings`]).

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Melody played once at the start of every scheduled feeding.
pub const FEEDING_MELODY: &str = "Beethoven - Fur Elise : d=4,o=5,b=160:8e7,8d#7,8e7,8d#7,8e7,8b6,8d7,8c7,8a6,8e,8a,8c6,8e6,8a6,8b6,8e,8g#,8e6,8g#6,8b6,8c7,8e,8a,8e6,8e7,8d#7,8e7,8d#7,8e7,8b6,8d7,8c7,8a6,8e,8a,8c6,8e6,8a6,8b6,8e,8g#,8e6,8c7,8b6,2a6,";

/// Short chirp used as the low-battery alert.
pub const LOW_BATTERY_BEEP: &str = "beep:o=7,b=64: 32a7";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeederConfig {
    // --- Tick ---
    /// Hardware tick period (microseconds).
    pub tick_period_us: u32,

    // --- Mechanism ---
    /// Sensor-confirmed steps that make up one serving.
    pub steps_per_serving: u8,
    /// Servo pulses granted to a single step before it counts as stalled.
    pub step_pulses: u16,
    /// Pause between powering down a jammed mechanism and backing off (ms).
    pub jam_pause_ms: u32,
    /// Servings delivered by the menu's test dispense.
    pub test_servings: u8,

    // --- Timing ---
    /// Menu levels and editors exit after this much button silence (seconds).
    pub menu_idle_timeout_secs: u32,
    /// Minimum spacing between schedule checks (seconds).
    pub schedule_check_interval_secs: u32,
    /// POWERSAVE sleep length before a background wake (milliseconds).
    pub wake_period_ms: u32,
    /// Reset if the main task goes this long without a keep-alive (milliseconds).
    pub watchdog_timeout_ms: u32,

    // --- Battery ---
    /// Alert below this supply voltage (millivolts).
    pub low_battery_mv: u16,
    /// ADC reference voltage (millivolts).
    pub adc_reference_mv: u32,
    /// ADC counts corresponding to the reference voltage.
    pub adc_full_scale: u32,

    // --- RTC ---
    /// Backup cell is rechargeable; trickle-charge it periodically.
    pub rechargeable_backup: bool,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            // Tick
            tick_period_us: 2_500,

            // Mechanism
            steps_per_serving: 4,
            step_pulses: 10,
            jam_pause_ms: 200,
            test_servings: 10,

            // Timing
            menu_idle_timeout_secs: 10,
            schedule_check_interval_secs: 30,
            wake_period_ms: 2_000,
            watchdog_timeout_ms: 8_000,

            // Battery
            low_battery_mv: 4_400,
            adc_reference_mv: 1_100,
            adc_full_scale: 1_024,

            // RTC
            rechargeable_backup: false,
        }
    }
}

impl FeederConfig {
    /// Full display frame refresh period (one digit per tick).
    pub fn frame_period_us(&self) -> u32 {
        self.tick_period_us * 3
    }

    /// Reject values the firmware cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.tick_period_us == 0 {
            return Err(Error::Config("tick_period_us must be > 0"));
        }
        if self.steps_per_serving == 0 || self.step_pulses == 0 {
            return Err(Error::Config("steps_per_serving and step_pulses must be > 0"));
        }
        if self.adc_full_scale == 0 {
            return Err(Error::Config("adc_full_scale must be > 0"));
        }
        if self.watchdog_timeout_ms <= self.wake_period_ms {
            return Err(Error::Config("watchdog_timeout_ms must exceed wake_period_ms"));
        }
        Ok(())
    }
}
