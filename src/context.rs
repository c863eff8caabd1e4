//! State owned by the main loop and threaded through every handler.
//!
//! `FeederContext` is the one place the schedule, calibration, power mode
//! and the background-processing timers live.  The event loop, the menu
//! and the feeding routine all take it by `&mut`; nothing here is shared
//! with the tick.

use log::info;

use crate::app::events::{AppEvent, FeedTrigger};
use crate::app::ports::{EventSink, FeederHardware};
use crate::config::{FeederConfig, FEEDING_MELODY};
use crate::control::{DispenseController, DispenseReport};
use crate::power::{PowerMode, PowerStateMachine};
use crate::scheduler::FeedingScheduler;
use crate::settings::Settings;

pub struct FeederContext {
    pub config: FeederConfig,
    pub scheduler: FeedingScheduler,
    /// Battery divider calibration, 750..=850.
    pub calibration: u16,
    pub dispenser: DispenseController,
    pub power: PowerStateMachine,
    /// Day-seconds of the last schedule check.
    pub last_schedule_check: u32,
    /// Minute of the last trickle-charge burst.
    pub last_charge_minute: Option<u8>,
}

impl FeederContext {
    pub fn new(config: FeederConfig, settings: Settings) -> Self {
        let settings = settings.sanitized();
        Self {
            dispenser: DispenseController::new(&config),
            scheduler: FeedingScheduler::new(settings.slots),
            calibration: settings.calibration,
            power: PowerStateMachine::new(),
            last_schedule_check: 0,
            last_charge_minute: None,
            config,
        }
    }

    /// Switch power mode and report a change.
    pub fn set_power_mode<H, E>(&mut self, hw: &mut H, sink: &mut E, mode: PowerMode)
    where
        H: FeederHardware,
        E: EventSink + ?Sized,
    {
        if let Some((from, to)) = self.power.enter(hw, mode) {
            sink.emit(&AppEvent::PowerModeChanged { from, to });
        }
    }

    /// Run one feeding: full power, the melody for scheduled feedings,
    /// the dispense itself, then drop any press made meanwhile.
    pub fn feed<H, E>(&mut self, hw: &mut H, sink: &mut E, servings: u8, trigger: FeedTrigger) -> DispenseReport
    where
        H: FeederHardware,
        E: EventSink + ?Sized,
    {
        hw.clear();
        self.set_power_mode(hw, sink, PowerMode::Full);
        sink.emit(&AppEvent::FeedingStarted { servings, trigger });
        info!("Feeding: {} servings ({:?})", servings, trigger);

        if trigger == FeedTrigger::Scheduled {
            hw.play(FEEDING_MELODY);
        }

        let report = self.dispenser.dispense(hw, sink, servings);
        hw.clear_buttons();

        sink.emit(&AppEvent::FeedingDone {
            servings,
            jams: report.jams,
        });
        report
    }
}
