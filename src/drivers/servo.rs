//! Continuous-rotation servo that turns the dispensing wheel.
//!
//! ## Hardware
//!
//! - LEDC PWM at 50 Hz on [`SERVO_PWM_GPIO`](crate::pins::SERVO_PWM_GPIO).
//!   A 1.0 ms pulse turns the wheel forward, 2.0 ms backward; duty 0 lets
//!   the servo coast.
//! - A high-side switch on [`SERVO_POWER_GPIO`](crate::pins::SERVO_POWER_GPIO)
//!   cuts the supply entirely between dispenses.
//!
//! ## Pulse budget
//!
//! The main loop never runs the servo open-ended.  It arms a
//! [`PulseTrain`] with a fixed number of 20 ms frames; the tick spends one
//! frame every eighth tick and drops the output to idle when the budget
//! runs out.  The train stays active until the frame after the last pulse
//! has been spent idle, so a wheel still coasting through its final frame
//! counts as moving for the dispense controller's stall detection.

use crate::app::ports::Direction;

/// Frames left to drive and the direction to drive them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTrain {
    remaining: u16,
    direction: Direction,
    active: bool,
}

impl PulseTrain {
    pub const fn idle() -> Self {
        Self {
            remaining: 0,
            direction: Direction::Forward,
            active: false,
        }
    }

    pub fn arm(&mut self, direction: Direction, pulses: u16) {
        self.direction = direction;
        self.remaining = pulses;
        self.active = pulses > 0;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Spend one frame.  Returns the output for the coming 20 ms.
    ///
    /// The first idle frame after the budget is spent ends the train.
    pub fn advance(&mut self) -> Option<Direction> {
        if self.remaining == 0 {
            self.active = false;
            return None;
        }
        self.remaining -= 1;
        Some(self.direction)
    }
}

impl Default for PulseTrain {
    fn default() -> Self {
        Self::idle()
    }
}

// ── PWM output ────────────────────────────────────────────────

/// Pulse widths in microseconds.
const FORWARD_PULSE_US: u32 = 1_000;
const BACK_PULSE_US: u32 = 2_000;

fn duty_for(output: Option<Direction>) -> u32 {
    let period_us = 1_000_000 / crate::pins::SERVO_PWM_FREQ_HZ;
    let full_scale = 1u32 << crate::pins::SERVO_PWM_RESOLUTION_BITS;
    let width = match output {
        None => return 0,
        Some(Direction::Forward) => FORWARD_PULSE_US,
        Some(Direction::Back) => BACK_PULSE_US,
    };
    width * full_scale / period_us
}

/// Apply one frame's output.  Tick context.
pub fn drive(output: Option<Direction>) {
    crate::drivers::hw_init::servo_set_duty(duty_for(output));
}

pub fn power(on: bool) {
    crate::drivers::hw_init::gpio_write(crate::pins::SERVO_POWER_GPIO, on);
    if !on {
        drive(None);
    }
}
