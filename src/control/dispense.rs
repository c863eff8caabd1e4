//! Closed-loop dispensing with jam recovery.
//!
//! ```text
//!  Idle ──dispense(n)──▶ Advancing ──[remaining == 0]──▶ Idle
//!                         │     ▲
//!               [no edge] │     │ [reverse step done]
//!                         ▼     │
//!                      Jammed ──▶ Recovering
//! ```
//!
//! One step is one slot of the wheel's sensor disc.  A forward step arms
//! the servo for a fixed pulse budget and waits, one tick at a time, for a
//! rising sensor edge.  An edge completes the step.  A budget that runs out
//! without an edge is a jam: the servo is powered off, left to relax for
//! `jam_pause_ms`, backed off by one reverse step, and the forward step is
//! retried.  Retries are unbounded; a wheel that never frees itself ends in
//! a watchdog reset, which leaves the persisted schedule untouched.
//!
//! The servo is powered off on every exit path, including unwinding, by the
//! [`MechanismSession`] guard.

use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{Direction, DisplayPort, EventSink, IdlePort, KeepAlive, MechanismPort};
use crate::config::FeederConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispenseState {
    Idle,
    Advancing,
    Jammed,
    Recovering,
}

/// Live state of one dispense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseSession {
    pub remaining_steps: u32,
    pub direction: Direction,
    /// Jams since the last successful forward step.
    pub consecutive_stalls: u32,
}

impl DispenseSession {
    pub fn new(servings: u8, steps_per_serving: u8) -> Self {
        Self {
            remaining_steps: servings as u32 * steps_per_serving as u32,
            direction: Direction::Forward,
            consecutive_stalls: 0,
        }
    }
}

/// Outcome of a completed dispense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseReport {
    pub servings: u8,
    pub steps: u32,
    pub jams: u32,
}

/// Powers the mechanism off when dropped.
pub struct MechanismSession<'a, H: MechanismPort> {
    hw: &'a mut H,
}

impl<'a, H: MechanismPort> MechanismSession<'a, H> {
    pub fn new(hw: &'a mut H) -> Self {
        Self { hw }
    }
}

impl<H: MechanismPort> Deref for MechanismSession<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.hw
    }
}

impl<H: MechanismPort> DerefMut for MechanismSession<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.hw
    }
}

impl<H: MechanismPort> Drop for MechanismSession<'_, H> {
    fn drop(&mut self) {
        self.hw.stop();
        self.hw.power_off();
    }
}

pub struct DispenseController {
    steps_per_serving: u8,
    step_pulses: u16,
    jam_pause_ms: u32,
    state: DispenseState,
}

impl DispenseController {
    pub fn new(config: &FeederConfig) -> Self {
        Self {
            steps_per_serving: config.steps_per_serving.max(1),
            step_pulses: config.step_pulses,
            jam_pause_ms: config.jam_pause_ms,
            state: DispenseState::Idle,
        }
    }

    pub fn state(&self) -> DispenseState {
        self.state
    }

    /// Deliver `servings`, showing the servings still to come.  Blocks until
    /// done; cannot be cancelled.
    pub fn dispense<H, E>(&mut self, hw: &mut H, events: &mut E, servings: u8) -> DispenseReport
    where
        H: MechanismPort + DisplayPort + IdlePort + KeepAlive + DelayNs,
        E: EventSink + ?Sized,
    {
        let mut session = DispenseSession::new(servings, self.steps_per_serving);
        let mut report = DispenseReport {
            servings,
            steps: 0,
            jams: 0,
        };
        info!("Dispense: {} servings ({} steps)", servings, session.remaining_steps);

        let mut mech = MechanismSession::new(hw);
        mech.show_decimal(servings as u16);
        self.state = DispenseState::Advancing;

        while session.remaining_steps > 0 {
            session.direction = Direction::Forward;
            if self.step(&mut *mech, Direction::Forward) {
                session.remaining_steps -= 1;
                session.consecutive_stalls = 0;
                report.steps += 1;
                if session.remaining_steps % self.steps_per_serving as u32 == 0 {
                    let left = session.remaining_steps / self.steps_per_serving as u32;
                    mech.show_decimal(left as u16);
                }
                continue;
            }

            self.state = DispenseState::Jammed;
            session.consecutive_stalls += 1;
            report.jams += 1;
            warn!(
                "Dispense: jam ({} in a row), {} steps left",
                session.consecutive_stalls, session.remaining_steps
            );
            events.emit(&AppEvent::Jam {
                consecutive: session.consecutive_stalls,
            });
            MechanismPort::power_off(&mut *mech);
            mech.delay_ms(self.jam_pause_ms);

            self.state = DispenseState::Recovering;
            session.direction = Direction::Back;
            self.step(&mut *mech, Direction::Back);
            self.state = DispenseState::Advancing;
        }

        drop(mech);
        self.state = DispenseState::Idle;
        info!("Dispense: done, {} jams", report.jams);
        report
    }

    /// One sensor step.  `true` when the sensor edge arrived before the
    /// pulse budget ran out.
    fn step<H>(&self, hw: &mut H, direction: Direction) -> bool
    where
        H: MechanismPort + IdlePort + KeepAlive,
    {
        hw.begin_step(direction, self.step_pulses);
        loop {
            hw.feed();
            if hw.take_sensor_edge() {
                hw.stop();
                return true;
            }
            if !hw.is_moving() {
                // The last frame may have produced the edge.
                let edge = hw.take_sensor_edge();
                hw.stop();
                return edge;
            }
            hw.wait_for_interrupt();
        }
    }
}
