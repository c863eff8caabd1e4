//! Wall-clock types and day-second arithmetic.
//!
//! The RTC is the only time source that survives POWERSAVE, so every
//! timeout in the firmware is measured in seconds since local midnight
//! ("day-seconds") read from the RTC, never in tick counts.

use crate::app::ports::RtcPort;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Decoded calendar date and time as kept by the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    /// Two-digit year, 0–99.
    pub year: u8,
    /// 1–12.
    pub month: u8,
    /// 1–31.
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 1–7.
    pub weekday: u8,
}

impl DateTime {
    /// Seconds elapsed since local midnight.
    pub fn day_seconds(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }

    pub fn wall_time(&self) -> WallTime {
        WallTime {
            hour: self.hour,
            minute: self.minute,
            day: self.day,
        }
    }
}

/// The subset of the date-time the scheduler compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
    /// Day of month, used only to suppress repeat triggers.
    pub day: u8,
}

/// Seconds from `from` to `now`, both day-seconds.  A `now` smaller than
/// `from` means midnight has passed in between.
pub fn seconds_between(from: u32, now: u32) -> u32 {
    if now >= from {
        now - from
    } else {
        now + SECONDS_PER_DAY - from
    }
}

/// Button-silence timer shared by every menu level and value editor.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimer {
    reference: u32,
    timeout_secs: u32,
}

impl IdleTimer {
    /// Start counting from the current RTC time.
    pub fn start(rtc: &mut impl RtcPort, timeout_secs: u32) -> Self {
        Self {
            reference: rtc.read_day_seconds(),
            timeout_secs,
        }
    }

    /// Restart after a qualifying button press.
    pub fn touch(&mut self, rtc: &mut impl RtcPort) {
        self.reference = rtc.read_day_seconds();
    }

    pub fn expired(&self, rtc: &mut impl RtcPort) -> bool {
        rtc.seconds_since(self.reference) >= self.timeout_secs
    }
}
