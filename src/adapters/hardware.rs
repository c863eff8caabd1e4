//! Hardware adapter: bridges the board to the domain port traits.
//!
//! Owns the RTC, the speaker and the watchdog; everything the tick drives
//! (display frame, servo pulse train, debounced buttons, sensor edge,
//! battery average) is reached through the shared [`TickShared`].  This is
//! the only module in the system that touches actual hardware.  On
//! non-espidf targets, the underlying drivers use cfg-gated simulation
//! stubs and the RTC is a register file.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{
    BatteryPort, Button, ButtonPort, Direction, DisplayPort, IdlePort, KeepAlive, MechanismPort,
    MelodyPort, PeripheralPort, RtcPort, SleepDepth, WakePort,
};
use crate::clock::DateTime;
use crate::config::FeederConfig;
use crate::drivers::ds1302::Ds1302;
use crate::drivers::melody::Speaker;
use crate::drivers::watchdog::Watchdog;
use crate::drivers::{hw_init, hw_timer, servo};
use crate::pins;
use crate::power::PowerMode;
use crate::tick::TickShared;

#[cfg(target_os = "espidf")]
type RtcBus = crate::drivers::ds1302::GpioBus;
#[cfg(not(target_os = "espidf"))]
type RtcBus = crate::drivers::ds1302::SimBus;

// ── Delay ─────────────────────────────────────────────────────

/// Blocking delay: ROM busy-wait below a millisecond, RTOS sleep above.
#[derive(Default)]
pub struct BoardDelay;

impl DelayNs for BoardDelay {
    fn delay_ns(&mut self, ns: u32) {
        #[cfg(target_os = "espidf")]
        {
            esp_idf_svc::hal::delay::Delay::new_default().delay_ns(ns);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
        }
    }
}

// ── Adapter ───────────────────────────────────────────────────

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    shared: &'static TickShared,
    rtc: Ds1302<RtcBus>,
    speaker: Speaker,
    watchdog: Watchdog,
    delay: BoardDelay,
    sleep_depth: SleepDepth,
    wake_period_us: u64,
}

impl HardwareAdapter {
    pub fn new(shared: &'static TickShared, config: &FeederConfig) -> Self {
        #[cfg(target_os = "espidf")]
        let bus = crate::drivers::ds1302::GpioBus;
        #[cfg(not(target_os = "espidf"))]
        let bus = crate::drivers::ds1302::SimBus::new();

        Self {
            shared,
            rtc: Ds1302::new(bus),
            speaker: Speaker,
            watchdog: Watchdog::new(config.watchdog_timeout_ms),
            delay: BoardDelay,
            sleep_depth: SleepDepth::Idle,
            wake_period_us: u64::from(config.wake_period_ms) * 1_000,
        }
    }

    /// Direct access to the RTC bus (simulation: the register file).
    pub fn rtc_bus(&mut self) -> &mut RtcBus {
        self.rtc.bus_mut()
    }
}

// ── RtcPort ───────────────────────────────────────────────────

impl RtcPort for HardwareAdapter {
    fn read_date_time(&mut self) -> DateTime {
        self.rtc.read_date_time()
    }

    fn write_date_time(&mut self, dt: &DateTime) {
        self.rtc.write_date_time(dt);
    }

    fn enable_charging(&mut self) {
        self.rtc.enable_charging();
    }

    fn disable_charging(&mut self) {
        self.rtc.disable_charging();
    }

    fn ensure_running(&mut self) -> bool {
        self.rtc.ensure_running()
    }

    fn read_day_seconds(&mut self) -> u32 {
        self.rtc.read_day_seconds()
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl DisplayPort for HardwareAdapter {
    fn set_text(&mut self, text: &str) {
        self.shared.with_display(|frame| {
            frame.putc(b'\n');
            frame.puts(text);
        });
    }

    fn clear(&mut self) {
        self.shared.with_display(|frame| frame.putc(b'\n'));
    }

    fn display_on(&mut self) {
        self.shared.with_display(|frame| frame.set_enabled(true));
    }

    fn display_off(&mut self) {
        self.shared.with_display(|frame| frame.set_enabled(false));
        crate::drivers::seven_segment::blank_digits();
    }

    fn show_decimal(&mut self, value: u16) {
        self.shared.with_display(|frame| frame.print_decimal(value));
    }

    fn show_hex(&mut self, value: u16) {
        self.shared.with_display(|frame| frame.print_hex(value));
    }
}

// ── MelodyPort ────────────────────────────────────────────────

impl MelodyPort for HardwareAdapter {
    fn play(&mut self, score: &str) {
        let watchdog = &mut self.watchdog;
        self.speaker.play(score, &mut self.delay, || watchdog.feed());
    }
}

// ── MechanismPort ─────────────────────────────────────────────

impl MechanismPort for HardwareAdapter {
    fn begin_step(&mut self, direction: Direction, pulses: u16) {
        self.shared.sensor.clear();
        servo::power(true);
        self.shared.arm_servo(direction, pulses);
    }

    fn stop(&mut self) {
        self.shared.cancel_servo();
    }

    fn power_off(&mut self) {
        self.shared.cancel_servo();
        servo::drive(None);
        servo::power(false);
    }

    fn is_moving(&self) -> bool {
        self.shared.servo_active()
    }

    fn take_sensor_edge(&mut self) -> bool {
        self.shared.sensor.take()
    }
}

// ── Buttons ───────────────────────────────────────────────────

impl ButtonPort for HardwareAdapter {
    fn read_button(&mut self) -> Option<Button> {
        self.shared.buttons.read()
    }

    fn clear_buttons(&mut self) {
        self.shared.buttons.clear();
    }
}

impl WakePort for HardwareAdapter {
    fn any_button_down(&mut self) -> bool {
        // Active low.
        pins::BUTTON_GPIOS.iter().any(|&pin| !hw_init::gpio_read(pin))
    }
}

// ── PeripheralPort ────────────────────────────────────────────

impl PeripheralPort for HardwareAdapter {
    fn publish_mode(&mut self, mode: PowerMode) {
        self.shared.publish_mode(mode);
    }

    fn set_sensor_power(&mut self, on: bool) {
        hw_init::gpio_write(pins::MOVEMENT_SENSOR_POWER_GPIO, on);
    }

    fn speaker_off(&mut self) {
        self.speaker.off();
    }

    fn servo_power_off(&mut self) {
        self.shared.cancel_servo();
        servo::drive(None);
        servo::power(false);
    }

    fn enable_button_pullups(&mut self) {
        hw_init::enable_button_pullups();
    }

    fn set_sleep_depth(&mut self, depth: SleepDepth) {
        self.sleep_depth = depth;
    }
}

// ── Battery, sleep, liveness ──────────────────────────────────

impl BatteryPort for HardwareAdapter {
    fn battery_raw(&self) -> u16 {
        self.shared.battery_raw()
    }
}

impl IdlePort for HardwareAdapter {
    fn wait_for_interrupt(&mut self) {
        hw_timer::wait_for_tick();
    }

    fn sleep_until_wake(&mut self) {
        match self.sleep_depth {
            SleepDepth::Idle => hw_timer::wait_for_tick(),
            SleepDepth::PowerDown => {
                hw_timer::pause_tick();
                hw_init::light_sleep(self.wake_period_us);
                hw_timer::resume_tick();
            }
        }
    }
}

impl KeepAlive for HardwareAdapter {
    fn feed(&mut self) {
        self.watchdog.feed();
    }
}

impl DelayNs for HardwareAdapter {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
