//! Three-button configuration menu.
//!
//! The tree itself is data ([`tree`]); this module walks it.  Each level is
//! a [`editor::choose`] loop over its items.  ENTER on a sub-level drills
//! in, ENTER on a field opens a value editor, ENTER on an action runs it.
//! Every level and editor exits after the idle timeout; returning from a
//! child restarts the parent's timer.  Nothing is committed unless the
//! editor saw ENTER.

pub mod editor;
pub mod tree;

use log::{info, warn};

use crate::app::events::{AppEvent, FeedTrigger};
use crate::app::ports::{EventSink, FeederHardware, SettingsStore};
use crate::clock::IdleTimer;
use crate::context::FeederContext;
use crate::power::PowerMode;
use crate::sensors::battery;
use crate::settings::{clamp_calibration, SLOT_COUNT};

use self::editor::{choose, edit_value, wait_for_press};
use self::tree::{Action, Field, MenuItem, MenuNode, SLOT_LABELS, TOP_MENU};

/// The collaborators a menu session borrows.
struct Session<'a, H, S: ?Sized, E: ?Sized> {
    hw: &'a mut H,
    ctx: &'a mut FeederContext,
    store: &'a mut S,
    sink: &'a mut E,
}

/// Run the menu until the top level times out.
pub fn run_menu<H, S, E>(hw: &mut H, ctx: &mut FeederContext, store: &mut S, sink: &mut E)
where
    H: FeederHardware,
    S: SettingsStore + ?Sized,
    E: EventSink + ?Sized,
{
    ctx.set_power_mode(hw, sink, PowerMode::Full);
    if ctx.config.rechargeable_backup {
        hw.enable_charging();
    }
    sink.emit(&AppEvent::MenuOpened);
    info!("Menu: open");

    // The press that woke us is still being debounced.  Consume it so it
    // is not taken as the first menu action.
    let timeout = ctx.config.menu_idle_timeout_secs;
    if wait_for_press(hw, timeout).is_none() {
        warn!("Menu: wake press never registered");
    }

    let mut session = Session { hw, ctx, store, sink };
    session.browse(&TOP_MENU, None);

    session.hw.clear();
    session.sink.emit(&AppEvent::MenuClosed);
    info!("Menu: closed");
}

impl<H, S, E> Session<'_, H, S, E>
where
    H: FeederHardware,
    S: SettingsStore + ?Sized,
    E: EventSink + ?Sized,
{
    fn timeout(&self) -> u32 {
        self.ctx.config.menu_idle_timeout_secs
    }

    fn browse(&mut self, items: &'static [MenuItem], slot: Option<usize>) {
        let timeout = self.timeout();
        let mut cursor = 0;
        while let Some(index) = choose(self.hw, items.len(), |i| items[i].label, &mut cursor, timeout) {
            match &items[index].node {
                MenuNode::Menu(children) => self.browse(children, slot),
                MenuNode::Slots(fields) => self.browse_slots(fields),
                MenuNode::Field(field) => self.edit(*field, slot),
                MenuNode::Action(action) => self.run(*action),
            }
        }
    }

    fn browse_slots(&mut self, fields: &'static [MenuItem]) {
        let timeout = self.timeout();
        let mut cursor = 0;
        while let Some(slot) = choose(self.hw, SLOT_COUNT, |i| SLOT_LABELS[i], &mut cursor, timeout) {
            self.browse(fields, Some(slot));
        }
    }

    // ── Fields ────────────────────────────────────────────────────

    fn edit(&mut self, field: Field, slot: Option<usize>) {
        match field {
            Field::SlotHour | Field::SlotMinute | Field::SlotServings => {
                if let Some(index) = slot {
                    self.edit_slot(field, index);
                }
            }
            Field::Calibration => self.edit_calibration(),
            _ => self.edit_clock(field),
        }
    }

    fn edit_slot(&mut self, field: Field, index: usize) {
        let Some(mut slot) = self.ctx.scheduler.slot(index) else {
            return;
        };
        let current = match field {
            Field::SlotHour => slot.hour,
            Field::SlotMinute => slot.minute,
            _ => slot.servings,
        };
        let (min, max) = field.range();
        let timeout = self.timeout();
        let Some(value) = edit_value(self.hw, current as u16, min, max, timeout) else {
            return;
        };

        let value = value as u8;
        match field {
            Field::SlotHour => slot.hour = value,
            Field::SlotMinute => slot.minute = value,
            _ => slot.servings = value,
        }
        let slot = slot.clamped();
        self.ctx.scheduler.set_slot(index, slot);
        if let Err(e) = self.store.save_slot(index, &slot) {
            warn!("Menu: saving slot {} failed: {}", index + 1, e);
            self.sink.emit(&AppEvent::StorageFailed);
        }
        self.sink.emit(&AppEvent::SlotSaved {
            index: index as u8,
            slot,
        });
    }

    fn edit_clock(&mut self, field: Field) {
        let shown = self.hw.read_date_time();
        let current = match field {
            Field::ClockHour => shown.hour,
            Field::ClockMinute => shown.minute,
            Field::ClockDay => shown.day,
            Field::ClockMonth => shown.month,
            _ => shown.year,
        };
        let (min, max) = field.range();
        let timeout = self.timeout();
        let Some(value) = edit_value(self.hw, current as u16, min, max, timeout) else {
            return;
        };

        // The clock kept running while the editor was open.
        let mut dt = self.hw.read_date_time();
        let value = value as u8;
        match field {
            Field::ClockHour => {
                dt.hour = value;
                dt.second = 0;
            }
            Field::ClockMinute => {
                dt.minute = value;
                dt.second = 0;
            }
            Field::ClockDay => dt.day = value,
            Field::ClockMonth => dt.month = value,
            _ => dt.year = value,
        }
        self.hw.write_date_time(&dt);
        info!(
            "Menu: clock set to {:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
        );
        self.sink.emit(&AppEvent::ClockSet);
    }

    fn edit_calibration(&mut self) {
        let (min, max) = Field::Calibration.range();
        let timeout = self.timeout();
        let Some(value) = edit_value(self.hw, self.ctx.calibration, min, max, timeout) else {
            return;
        };
        let value = clamp_calibration(value);
        self.ctx.calibration = value;
        if let Err(e) = self.store.save_calibration(value) {
            warn!("Menu: saving calibration failed: {}", e);
            self.sink.emit(&AppEvent::StorageFailed);
        }
        self.sink.emit(&AppEvent::CalibrationSaved { value });
    }

    // ── Actions ───────────────────────────────────────────────────

    fn run(&mut self, action: Action) {
        match action {
            Action::ShowBattery => self.show_battery(),
            Action::TestDispense => {
                let servings = self.ctx.config.test_servings;
                self.ctx.feed(self.hw, self.sink, servings, FeedTrigger::Test);
            }
        }
    }

    /// Supply voltage in tens of millivolts until a press or the timeout.
    /// Tens of millivolts, redrawn whenever the average moves, until any
    /// press or the idle timeout.
    fn show_battery(&mut self) {
        let timeout = self.timeout();
        let timer = IdleTimer::start(self.hw, timeout);
        let mut shown = None;

        loop {
            self.hw.feed();
            let raw = self.hw.battery_raw();
            let mv = battery::battery_millivolts(raw, self.ctx.calibration, &self.ctx.config);
            let tens = (mv / 10).min(u16::MAX as u32) as u16;
            if shown != Some(tens) {
                info!("Menu: battery {} mV (raw {})", mv, raw);
                self.hw.show_decimal(tens);
                shown = Some(tens);
            }
            if timer.expired(self.hw) || self.hw.read_button().is_some() {
                return;
            }
            self.hw.wait_for_interrupt();
        }
    }
}
