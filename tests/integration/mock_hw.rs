//! Mock board for integration tests.
//!
//! Implements every hardware port with a scripted clock, scripted button
//! presses and a simulated dispensing wheel, and records what the domain
//! asked of it so tests can assert on the full history without touching
//! real GPIO/PWM registers.
//!
//! Time model: each `wait_for_interrupt` is one 2.5 ms tick and 400 ticks
//! advance the RTC by one second.  `sleep_until_wake` advances it by the
//! wake period.

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;
use petfeeder::app::events::AppEvent;
use petfeeder::app::ports::{
    BatteryPort, Button, ButtonPort, Direction, DisplayPort, EventSink, IdlePort, KeepAlive,
    MechanismPort, MelodyPort, PeripheralPort, RtcPort, SettingsStore, SleepDepth, StorageError,
    WakePort,
};
use petfeeder::clock::DateTime;
use petfeeder::power::PowerMode;
use petfeeder::settings::{ScheduleSlot, Settings};

pub const TICKS_PER_SECOND: u32 = 400;
pub const WAKE_PERIOD_SECS: u32 = 2;
/// Waits a healthy step takes to reach the next slot.
const STEP_WAITS: u16 = 3;

// ── MockBoard ─────────────────────────────────────────────────

#[allow(dead_code)]
pub struct MockBoard {
    // Clock
    pub now: DateTime,
    pub halted: bool,
    pub charging: Option<bool>,
    pub rtc_writes: Vec<DateTime>,
    sub_ticks: u32,

    // Buttons: (ticks to wait since the previous press, button).
    presses: VecDeque<(u32, Button)>,
    ticks_since_press: u32,
    pub wake_button_down: VecDeque<bool>,

    // Wheel
    /// Outcome per forward step; missing entries succeed.
    pub forward_script: VecDeque<bool>,
    pub forward_steps: u32,
    pub back_steps: u32,
    servo_powered: bool,
    pulses_left: u16,
    edge_in: Option<u16>,
    edge: bool,

    // Outputs
    pub texts: Vec<String>,
    pub decimals: Vec<u16>,
    pub display_lit: bool,
    pub melodies: Vec<String>,
    pub published: Vec<PowerMode>,
    pub sleep_depth: SleepDepth,
    pub delays_ms: Vec<u32>,
    pub feeds: u64,
    pub battery: u16,
    /// Ticks until `battery` takes the new reading.
    battery_change: Option<(u32, u16)>,
}

#[allow(dead_code)]
impl MockBoard {
    /// A running clock at `hour:minute:second` on day 15 of July 2024.
    pub fn at(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            now: DateTime {
                year: 24,
                month: 7,
                day: 15,
                hour,
                minute,
                second,
                weekday: 1,
            },
            halted: false,
            charging: None,
            rtc_writes: Vec::new(),
            sub_ticks: 0,
            presses: VecDeque::new(),
            ticks_since_press: 0,
            wake_button_down: VecDeque::new(),
            forward_script: VecDeque::new(),
            forward_steps: 0,
            back_steps: 0,
            servo_powered: false,
            pulses_left: 0,
            edge_in: None,
            edge: false,
            texts: Vec::new(),
            decimals: Vec::new(),
            display_lit: false,
            melodies: Vec::new(),
            published: Vec::new(),
            sleep_depth: SleepDepth::Idle,
            delays_ms: Vec::new(),
            feeds: 0,
            battery: 0,
            battery_change: None,
        }
    }

    /// Queue a press that registers `after_ticks` ticks after the previous one.
    pub fn press(&mut self, after_ticks: u32, button: Button) -> &mut Self {
        self.presses.push_back((after_ticks, button));
        self
    }

    /// Queue `count` presses of `button`, 20 ticks apart.
    pub fn press_n(&mut self, count: usize, button: Button) -> &mut Self {
        for _ in 0..count {
            self.press(20, button);
        }
        self
    }

    /// Wake with a button held and queue the wake press itself.
    pub fn wake_for_menu(&mut self) -> &mut Self {
        self.wake_button_down.push_back(true);
        self.press(8, Button::Enter)
    }

    /// The battery reads `raw` once `after_ticks` more ticks have passed.
    pub fn change_battery(&mut self, after_ticks: u32, raw: u16) -> &mut Self {
        self.battery_change = Some((after_ticks, raw));
        self
    }

    pub fn pending_presses(&self) -> usize {
        self.presses.len()
    }

    pub fn servo_powered(&self) -> bool {
        self.servo_powered
    }

    fn advance_seconds(&mut self, seconds: u32) {
        if self.halted {
            return;
        }
        let total = self.now.day_seconds() + seconds;
        if total >= 24 * 3600 {
            self.now.day += 1;
        }
        let total = total % (24 * 3600);
        self.now.hour = (total / 3600) as u8;
        self.now.minute = (total / 60 % 60) as u8;
        self.now.second = (total % 60) as u8;
    }

    fn tick(&mut self) {
        self.sub_ticks += 1;
        if self.sub_ticks >= TICKS_PER_SECOND {
            self.sub_ticks = 0;
            self.advance_seconds(1);
        }
        self.ticks_since_press = self.ticks_since_press.saturating_add(1);

        if let Some((after, raw)) = self.battery_change.as_mut() {
            *after = after.saturating_sub(1);
            if *after == 0 {
                self.battery = *raw;
                self.battery_change = None;
            }
        }

        if self.pulses_left > 0 {
            self.pulses_left -= 1;
            if let Some(n) = self.edge_in.as_mut() {
                *n -= 1;
                if *n == 0 {
                    self.edge = true;
                    self.edge_in = None;
                }
            }
        }
    }
}

// ── RtcPort ───────────────────────────────────────────────────

impl RtcPort for MockBoard {
    fn read_date_time(&mut self) -> DateTime {
        self.now
    }

    fn write_date_time(&mut self, dt: &DateTime) {
        self.now = *dt;
        self.halted = false;
        self.rtc_writes.push(*dt);
    }

    fn enable_charging(&mut self) {
        self.charging = Some(true);
    }

    fn disable_charging(&mut self) {
        self.charging = Some(false);
    }

    fn ensure_running(&mut self) -> bool {
        if !self.halted {
            return false;
        }
        self.write_date_time(&DateTime {
            year: 16,
            month: 7,
            day: 10,
            hour: 0,
            minute: 0,
            second: 0,
            weekday: 7,
        });
        true
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl DisplayPort for MockBoard {
    fn set_text(&mut self, text: &str) {
        self.texts.push(text.to_owned());
    }

    fn clear(&mut self) {}

    fn display_on(&mut self) {
        self.display_lit = true;
    }

    fn display_off(&mut self) {
        self.display_lit = false;
    }

    fn show_decimal(&mut self, value: u16) {
        self.decimals.push(value);
    }

    fn show_hex(&mut self, _value: u16) {}
}

impl MelodyPort for MockBoard {
    fn play(&mut self, score: &str) {
        self.melodies.push(score.to_owned());
    }
}

// ── MechanismPort ─────────────────────────────────────────────

impl MechanismPort for MockBoard {
    fn begin_step(&mut self, direction: Direction, pulses: u16) {
        self.servo_powered = true;
        self.pulses_left = pulses;
        self.edge = false;
        let succeeds = match direction {
            Direction::Forward => {
                self.forward_steps += 1;
                self.forward_script.pop_front().unwrap_or(true)
            }
            Direction::Back => {
                self.back_steps += 1;
                true
            }
        };
        self.edge_in = succeeds.then_some(STEP_WAITS);
    }

    fn stop(&mut self) {
        self.pulses_left = 0;
        self.edge_in = None;
    }

    fn power_off(&mut self) {
        self.stop();
        self.servo_powered = false;
    }

    fn is_moving(&self) -> bool {
        self.pulses_left > 0
    }

    fn take_sensor_edge(&mut self) -> bool {
        std::mem::take(&mut self.edge)
    }
}

// ── Buttons ───────────────────────────────────────────────────

impl ButtonPort for MockBoard {
    fn read_button(&mut self) -> Option<Button> {
        let &(after, button) = self.presses.front()?;
        if self.ticks_since_press < after {
            return None;
        }
        self.presses.pop_front();
        self.ticks_since_press = 0;
        Some(button)
    }

    fn clear_buttons(&mut self) {}
}

impl WakePort for MockBoard {
    fn any_button_down(&mut self) -> bool {
        self.wake_button_down.pop_front().unwrap_or(false)
    }
}

// ── PeripheralPort ────────────────────────────────────────────

impl PeripheralPort for MockBoard {
    fn publish_mode(&mut self, mode: PowerMode) {
        if self.published.last() != Some(&mode) {
            self.published.push(mode);
        }
    }

    fn set_sensor_power(&mut self, _on: bool) {}

    fn speaker_off(&mut self) {}

    fn servo_power_off(&mut self) {
        self.servo_powered = false;
    }

    fn enable_button_pullups(&mut self) {}

    fn set_sleep_depth(&mut self, depth: SleepDepth) {
        self.sleep_depth = depth;
    }
}

// ── Battery, sleep, liveness ──────────────────────────────────

impl BatteryPort for MockBoard {
    fn battery_raw(&self) -> u16 {
        self.battery
    }
}

impl IdlePort for MockBoard {
    fn wait_for_interrupt(&mut self) {
        self.tick();
    }

    fn sleep_until_wake(&mut self) {
        self.sub_ticks = 0;
        self.advance_seconds(WAKE_PERIOD_SECS);
    }
}

impl KeepAlive for MockBoard {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

// ── MemStore ──────────────────────────────────────────────────

/// In-memory [`SettingsStore`] that can be told to fail.
#[derive(Default)]
pub struct MemStore {
    pub slots: HashMap<usize, ScheduleSlot>,
    pub calibration: Option<u16>,
    pub fail_load: bool,
    pub fail_writes: bool,
}

impl SettingsStore for MemStore {
    fn load(&self) -> Result<Settings, StorageError> {
        if self.fail_load {
            return Err(StorageError::IoError);
        }
        let mut settings = Settings::default();
        for (&index, slot) in &self.slots {
            settings.slots[index] = *slot;
        }
        if let Some(value) = self.calibration {
            settings.calibration = value;
        }
        Ok(settings.sanitized())
    }

    fn save_slot(&mut self, index: usize, slot: &ScheduleSlot) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.slots.insert(index, *slot);
        Ok(())
    }

    fn save_calibration(&mut self, value: u16) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.calibration = Some(value);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
