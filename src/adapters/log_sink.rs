//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { enabled_slots } => {
                info!("START | slots_enabled={}", enabled_slots);
            }
            AppEvent::PowerModeChanged { from, to } => {
                info!("POWER | {} -> {}", from.name(), to.name());
            }
            AppEvent::FeedingStarted { servings, trigger } => {
                info!("FEED  | start servings={} trigger={:?}", servings, trigger);
            }
            AppEvent::FeedingDone { servings, jams } => {
                info!("FEED  | done servings={} jams={}", servings, jams);
            }
            AppEvent::Jam { consecutive } => {
                warn!("JAM   | consecutive={}", consecutive);
            }
            AppEvent::LowBattery { millivolts } => {
                warn!("BATT  | low {} mV", millivolts);
            }
            AppEvent::MenuOpened => info!("MENU  | open"),
            AppEvent::MenuClosed => info!("MENU  | closed"),
            AppEvent::SlotSaved { index, slot } => {
                info!(
                    "SCHED | F{} = {:02}:{:02} x{}",
                    index + 1,
                    slot.hour,
                    slot.minute,
                    slot.servings
                );
            }
            AppEvent::CalibrationSaved { value } => {
                info!("CAL   | {}", value);
            }
            AppEvent::ClockSet => info!("CLOCK | set"),
            AppEvent::StorageFailed => warn!("STORE | write failed, running from RAM"),
        }
    }
}
