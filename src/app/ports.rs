//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederService (domain)
//! ```
//!
//! Driven adapters (RTC, display, speaker, mechanism, buttons, storage,
//! event sinks) implement these traits.  The
//! [`FeederService`](super::service::FeederService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Every wait in the domain is a loop around [`IdlePort::wait_for_interrupt`]
//! that calls [`KeepAlive::feed`] once per iteration.

use embedded_hal::delay::DelayNs;

use crate::clock::{self, DateTime};
use crate::power::PowerMode;
use crate::settings::{ScheduleSlot, Settings};

// ───────────────────────────────────────────────────────────────
// Real-time clock
// ───────────────────────────────────────────────────────────────

/// Battery-backed calendar clock.  Values cross this boundary decoded;
/// BCD stays inside the driver.
pub trait RtcPort {
    fn read_date_time(&mut self) -> DateTime;

    fn write_date_time(&mut self, dt: &DateTime);

    /// Start trickle-charging the backup cell.
    fn enable_charging(&mut self);

    fn disable_charging(&mut self);

    /// Restart a halted oscillator from a fixed date.  Returns `true` if
    /// the clock had stopped.
    fn ensure_running(&mut self) -> bool;

    /// Seconds since local midnight.
    fn read_day_seconds(&mut self) -> u32 {
        self.read_date_time().day_seconds()
    }

    /// Seconds elapsed since `reference` (day-seconds), wrapping at midnight.
    fn seconds_since(&mut self, reference: u32) -> u32 {
        clock::seconds_between(reference, self.read_day_seconds())
    }
}

// ───────────────────────────────────────────────────────────────
// Display
// ───────────────────────────────────────────────────────────────

/// Three-digit seven-segment display.
pub trait DisplayPort {
    /// Show up to three characters, left-aligned.
    fn set_text(&mut self, text: &str);

    fn clear(&mut self);

    fn display_on(&mut self);

    fn display_off(&mut self);

    /// Show the last three decimal digits of `value`.
    fn show_decimal(&mut self, value: u16);

    /// Show the low three hex nibbles of `value`.
    fn show_hex(&mut self, value: u16);
}

// ───────────────────────────────────────────────────────────────
// Speaker
// ───────────────────────────────────────────────────────────────

pub trait MelodyPort {
    /// Play an RTTTL score, blocking until it finishes.  Malformed scores
    /// play nothing.
    fn play(&mut self, score: &str);
}

// ───────────────────────────────────────────────────────────────
// Dispense mechanism
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
}

/// Servo-driven dispensing wheel with a slotted-disc position sensor.
pub trait MechanismPort {
    /// Power the servo, point it in `direction` and grant it `pulses`
    /// drive pulses.  Clears any stale sensor edge.
    fn begin_step(&mut self, direction: Direction, pulses: u16);

    /// Cancel the remaining pulses; the servo stays powered.
    fn stop(&mut self);

    /// Cut servo power.
    fn power_off(&mut self);

    /// Drive pulses remain.
    fn is_moving(&self) -> bool;

    /// A rising edge was seen on the position sensor since the last call.
    fn take_sensor_edge(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Buttons
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Minus,
    Plus,
    Enter,
}

pub trait ButtonPort {
    /// Consume one pending press.  MINUS wins over PLUS, PLUS over ENTER.
    fn read_button(&mut self) -> Option<Button>;

    /// Drop every pending press.
    fn clear_buttons(&mut self);
}

/// Raw wake-time inspection of the button pins.
pub trait WakePort {
    /// Any button is held down right now.
    fn any_button_down(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Power gating (used only by the power state machine)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepDepth {
    /// CPU halts, timers and the tick keep running.
    Idle,
    /// Everything stops except the wake sources.
    PowerDown,
}

pub trait PeripheralPort {
    /// Make `mode` visible to the tick.  Called before peripherals are
    /// switched off and after they are switched on.
    fn publish_mode(&mut self, mode: PowerMode);

    fn set_sensor_power(&mut self, on: bool);

    fn speaker_off(&mut self);

    fn servo_power_off(&mut self);

    /// Keep the button pull-ups on so a press can still wake the chip.
    fn enable_button_pullups(&mut self);

    fn set_sleep_depth(&mut self, depth: SleepDepth);
}

// ───────────────────────────────────────────────────────────────
// Battery
// ───────────────────────────────────────────────────────────────

pub trait BatteryPort {
    /// Last committed 64-sample ADC average; 0 until the first commit.
    fn battery_raw(&self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Sleep and liveness
// ───────────────────────────────────────────────────────────────

pub trait IdlePort {
    /// Halt until any enabled interrupt fires (normally the next tick).
    fn wait_for_interrupt(&mut self);

    /// Sleep at the configured depth until a watchdog or button wake.
    fn sleep_until_wake(&mut self);
}

/// Liveness keep-alive, fed once per iteration of every wait loop.
pub trait KeepAlive {
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Everything the event loop drives
// ───────────────────────────────────────────────────────────────

/// The full board.  The hardware adapter and the test mocks implement each
/// port; this bundle saves spelling the list out at every call site.
pub trait FeederHardware:
    RtcPort
    + DisplayPort
    + MelodyPort
    + MechanismPort
    + ButtonPort
    + WakePort
    + PeripheralPort
    + BatteryPort
    + IdlePort
    + KeepAlive
    + DelayNs
{
}

impl<T> FeederHardware for T where
    T: RtcPort
        + DisplayPort
        + MelodyPort
        + MechanismPort
        + ButtonPort
        + WakePort
        + PeripheralPort
        + BatteryPort
        + IdlePort
        + KeepAlive
        + DelayNs
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Settings storage (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent schedule and calibration.
///
/// Writes are per slot so a menu edit touches only the slot it changed.
/// Implementations return clamped values from [`load`](Self::load).
pub trait SettingsStore {
    /// Load the full record.  Missing keys fall back to the factory image.
    fn load(&self) -> Result<Settings, StorageError>;

    fn save_slot(&mut self, index: usize, slot: &ScheduleSlot) -> Result<(), StorageError>;

    fn save_calibration(&mut self, value: u16) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SettingsStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Stored blob failed to decode.
    Corrupted,
    /// Slot index outside 0..10.
    BadIndex,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "stored value corrupted"),
            Self::BadIndex => write!(f, "slot index out of range"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
