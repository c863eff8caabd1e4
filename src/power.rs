//! Three-tier power-mode state machine.
//!
//! ```text
//!            wake (watchdog or button)
//!  POWERSAVE ─────────────────────────▶ LOW ──[menu / dispense]──▶ FULL
//!      ▲                                 │                           │
//!      └─────────────────────────────────┴───────[loop end]──────────┘
//! ```
//!
//! Each mode is one row of a static profile table describing which
//! peripherals are powered and how deep the CPU sleeps.  Entering a mode
//! applies its row; the mode is published to the tick through
//! [`PeripheralPort::publish_mode`] *before* anything is switched off and
//! *after* anything is switched on, so the tick never drives a peripheral
//! that is unpowered.

use log::debug;

use crate::app::ports::{DisplayPort, PeripheralPort, SleepDepth};

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PowerMode {
    /// Display, servo, buttons and sensor live; idle sleep between ticks.
    Full = 0,
    /// Wake-time bookkeeping only; idle sleep.
    Low = 1,
    /// Everything off except the wake sources; deepest sleep.
    PowerSave = 2,
}

impl PowerMode {
    pub const COUNT: usize = 3;

    /// Decode a published value.  Unknown values read as `PowerSave`, in
    /// which the tick drives nothing.
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Full,
            1 => Self::Low,
            2 => Self::PowerSave,
            _ => {
                debug_assert!(false, "invalid power mode: {raw}");
                Self::PowerSave
            }
        }
    }

    pub fn name(self) -> &'static str {
        PROFILES[self as usize].name
    }
}

// ---------------------------------------------------------------------------
// Mode profiles (one row per mode)
// ---------------------------------------------------------------------------

/// What a mode powers.
pub struct ModeProfile {
    pub mode: PowerMode,
    pub name: &'static str,
    pub display: bool,
    pub sensor: bool,
    /// Cut servo supply on entry.
    pub servo_off: bool,
    /// Re-assert button pull-ups so a press can wake the chip.
    pub wake_pullups: bool,
    pub sleep: SleepDepth,
}

static PROFILES: [ModeProfile; PowerMode::COUNT] = [
    ModeProfile {
        mode: PowerMode::Full,
        name: "FULL",
        display: true,
        sensor: true,
        servo_off: false,
        wake_pullups: false,
        sleep: SleepDepth::Idle,
    },
    ModeProfile {
        mode: PowerMode::Low,
        name: "LOW",
        display: false,
        sensor: false,
        servo_off: false,
        wake_pullups: false,
        sleep: SleepDepth::Idle,
    },
    ModeProfile {
        mode: PowerMode::PowerSave,
        name: "POWERSAVE",
        display: false,
        sensor: false,
        servo_off: true,
        wake_pullups: true,
        sleep: SleepDepth::PowerDown,
    },
];

pub fn profile(mode: PowerMode) -> &'static ModeProfile {
    &PROFILES[mode as usize]
}

// ---------------------------------------------------------------------------
// Wake classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// A button was down at wake: run the menu.
    MenuRequested,
    /// Watchdog period elapsed: run background processing.
    BackgroundTick,
}

impl WakeReason {
    pub fn classify(button_down: bool) -> Self {
        if button_down {
            Self::MenuRequested
        } else {
            Self::BackgroundTick
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub struct PowerStateMachine {
    mode: PowerMode,
}

impl PowerStateMachine {
    /// Boot runs in FULL.
    pub fn new() -> Self {
        Self {
            mode: PowerMode::Full,
        }
    }

    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    /// Apply `to`'s profile.  Re-entering the current mode re-applies it.
    /// Returns `Some((from, to))` when the mode actually changed.
    pub fn enter<H>(&mut self, hw: &mut H, to: PowerMode) -> Option<(PowerMode, PowerMode)>
    where
        H: DisplayPort + PeripheralPort,
    {
        let p = profile(to);

        if !p.display {
            hw.publish_mode(to);
            hw.display_off();
        }

        hw.speaker_off();
        hw.set_sensor_power(p.sensor);
        if p.servo_off {
            hw.servo_power_off();
        }
        if p.wake_pullups {
            hw.enable_button_pullups();
        }
        hw.set_sleep_depth(p.sleep);

        if p.display {
            hw.display_on();
            hw.publish_mode(to);
        }

        let from = core::mem::replace(&mut self.mode, to);
        if from == to {
            return None;
        }
        debug!("power: {} -> {}", from.name(), to.name());
        Some((from, to))
    }
}

impl Default for PowerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
