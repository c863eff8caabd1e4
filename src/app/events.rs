//! Outbound application events.
//!
//! The [`FeederService`](super::service::FeederService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the shipped one logs to serial.

use crate::power::PowerMode;
use crate::settings::ScheduleSlot;

/// Why a dispense was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTrigger {
    /// A schedule slot came due.
    Scheduled,
    /// `TST` from the menu.
    Test,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished; carries the number of enabled schedule slots.
    Started { enabled_slots: u8 },

    /// The power mode changed.
    PowerModeChanged { from: PowerMode, to: PowerMode },

    /// A dispense began.
    FeedingStarted { servings: u8, trigger: FeedTrigger },

    /// A dispense delivered every serving.
    FeedingDone { servings: u8, jams: u32 },

    /// The mechanism failed to advance and is being backed off.
    Jam { consecutive: u32 },

    /// Battery below the alert threshold.
    LowBattery { millivolts: u32 },

    MenuOpened,

    MenuClosed,

    /// A schedule slot was edited and committed.
    SlotSaved { index: u8, slot: ScheduleSlot },

    CalibrationSaved { value: u16 },

    /// The RTC date-time was edited.
    ClockSet,

    /// A persistence write failed; the in-RAM copy stays authoritative.
    StorageFailed,
}
