//! Application service: the top-level event loop.
//!
//! [`FeederService`] owns the [`FeederContext`] and runs one iteration of
//! the wake cycle per [`run_once`](FeederService::run_once) call.  All I/O
//! flows through port traits injected at call sites, so the whole loop can
//! be driven by mock adapters on the host.
//!
//! ```text
//!  ┌──────────────┐ wake ┌─────┐ button down ┌──────────┐
//!  │  POWERSAVE   │─────▶│ LOW │────────────▶│   menu   │──┐
//!  │ sleep_until_ │      └─────┘             └──────────┘  │
//!  │    wake      │         │ watchdog      ┌────────────┐ │
//!  └──────────────┘         └──────────────▶│ background │─┤
//!         ▲                                 └────────────┘ │
//!         └────────────────────────────────────────────────┘
//! ```

use log::{info, warn};

use crate::clock;
use crate::config::{FeederConfig, LOW_BATTERY_BEEP};
use crate::context::FeederContext;
use crate::menu;
use crate::power::{PowerMode, WakeReason};
use crate::sensors::battery;
use crate::settings::Settings;

use super::events::{AppEvent, FeedTrigger};
use super::ports::{EventSink, FeederHardware, SettingsStore};

// ───────────────────────────────────────────────────────────────
// FeederService
// ───────────────────────────────────────────────────────────────

pub struct FeederService {
    ctx: FeederContext,
}

impl FeederService {
    /// Construct with the factory schedule.  Call [`boot`](Self::boot)
    /// before the first [`run_once`](Self::run_once).
    pub fn new(config: FeederConfig) -> Self {
        Self {
            ctx: FeederContext::new(config, Settings::default()),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load settings, make sure the RTC is ticking and settle into
    /// POWERSAVE.  A storage failure falls back to the factory image.
    pub fn boot<H, S, E>(&mut self, hw: &mut H, store: &S, sink: &mut E)
    where
        H: FeederHardware,
        S: SettingsStore + ?Sized,
        E: EventSink + ?Sized,
    {
        let settings = match store.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings load failed ({}), using factory defaults", e);
                sink.emit(&AppEvent::StorageFailed);
                Settings::default()
            }
        };
        self.ctx = FeederContext::new(self.ctx.config.clone(), settings);

        if hw.ensure_running() {
            warn!("RTC was halted; clock reset");
        }
        if !self.ctx.config.rechargeable_backup {
            hw.disable_charging();
        }
        self.ctx.last_schedule_check = hw.read_day_seconds();

        let enabled_slots = self.ctx.scheduler.enabled_count() as u8;
        sink.emit(&AppEvent::Started { enabled_slots });
        info!(
            "FeederService started: {} slots enabled, calibration {}",
            enabled_slots, self.ctx.calibration
        );

        self.ctx.set_power_mode(hw, sink, PowerMode::PowerSave);
    }

    // ── Wake cycle ────────────────────────────────────────────

    /// Sleep, wake, dispatch, and return to POWERSAVE.
    pub fn run_once<H, S, E>(&mut self, hw: &mut H, store: &mut S, sink: &mut E) -> WakeReason
    where
        H: FeederHardware,
        S: SettingsStore + ?Sized,
        E: EventSink + ?Sized,
    {
        hw.sleep_until_wake();
        hw.feed();
        self.ctx.set_power_mode(hw, sink, PowerMode::Low);

        let reason = WakeReason::classify(hw.any_button_down());
        match reason {
            WakeReason::MenuRequested => menu::run_menu(hw, &mut self.ctx, store, sink),
            WakeReason::BackgroundTick => self.background(hw, sink),
        }

        self.ctx.set_power_mode(hw, sink, PowerMode::PowerSave);
        reason
    }

    /// Wake-time bookkeeping: backup-cell charging, then, at most once
    /// per check interval, the schedule and the battery.
    pub fn background<H, E>(&mut self, hw: &mut H, sink: &mut E)
    where
        H: FeederHardware,
        E: EventSink + ?Sized,
    {
        let now = hw.read_date_time();

        if self.ctx.config.rechargeable_backup {
            if self.ctx.last_charge_minute == Some(now.minute) {
                hw.disable_charging();
            } else {
                hw.enable_charging();
                self.ctx.last_charge_minute = Some(now.minute);
            }
        }

        let seconds = now.day_seconds();
        if clock::seconds_between(self.ctx.last_schedule_check, seconds)
            < self.ctx.config.schedule_check_interval_secs
        {
            return;
        }
        self.ctx.last_schedule_check = seconds;

        if let Some(servings) = self.ctx.scheduler.check_due(now.wall_time()) {
            self.ctx.feed(hw, sink, servings, FeedTrigger::Scheduled);
        }

        let raw = hw.battery_raw();
        if battery::is_low(raw, self.ctx.calibration, &self.ctx.config) {
            let millivolts = battery::battery_millivolts(raw, self.ctx.calibration, &self.ctx.config);
            warn!("Battery low: {} mV", millivolts);
            sink.emit(&AppEvent::LowBattery { millivolts });
            hw.play(LOW_BATTERY_BEEP);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn context(&self) -> &FeederContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut FeederContext {
        &mut self.ctx
    }

    pub fn power_mode(&self) -> PowerMode {
        self.ctx.power.mode()
    }
}
