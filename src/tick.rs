//! The 2.5 ms periodic tick and the state it shares with the main loop.
//!
//! ```text
//!   hw_timer ──▶ TickMultiplexer::on_tick ──▶ TickShared ◀── main loop
//!                      │                         (atomics + CS mutexes)
//!                      ▼
//!                   TickIo (pins, LEDC, ADC)
//! ```
//!
//! Per tick, in FULL power:
//! 1. light the next display digit;
//! 2. every eighth tick, spend one servo frame;
//! 3. sample the buttons into their debouncers and the wheel sensor into
//!    its edge latch.
//!
//! Every eighth tick, in any mode the tick runs in, the finished ADC
//! conversion is fed to the battery averager and a new one is started.
//!
//! Single-flag state is atomic.  The averager, the servo pulse train and
//! the display frame are multi-field and only touched inside
//! `critical_section::with`, kept as short as a copy or a counter update.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;

use crate::app::ports::Direction;
use crate::drivers::button::ButtonBank;
use crate::drivers::seven_segment::Frame;
use crate::drivers::servo::PulseTrain;
use crate::power::PowerMode;
use crate::sensors::{AnalogAverager, EdgeLatch};

/// Ticks per servo frame and per ADC sample.
pub const SLOW_DIVIDER: u8 = 8;

/// Everything the tick and the main loop both touch.
pub struct TickShared {
    mode: AtomicU8,
    pub buttons: ButtonBank,
    pub sensor: EdgeLatch,
    pub battery: Mutex<RefCell<AnalogAverager>>,
    pub servo: Mutex<RefCell<PulseTrain>>,
    pub display: Mutex<RefCell<Frame>>,
}

impl TickShared {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(PowerMode::Full as u8),
            buttons: ButtonBank::new(),
            sensor: EdgeLatch::new(),
            battery: Mutex::new(RefCell::new(AnalogAverager::new())),
            servo: Mutex::new(RefCell::new(PulseTrain::idle())),
            display: Mutex::new(RefCell::new(Frame::new())),
        }
    }

    pub fn mode(&self) -> PowerMode {
        PowerMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Publish the power mode.  Only the power state machine calls this.
    pub fn publish_mode(&self, mode: PowerMode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    pub fn battery_raw(&self) -> u16 {
        critical_section::with(|cs| self.battery.borrow_ref(cs).get())
    }

    pub fn arm_servo(&self, direction: Direction, pulses: u16) {
        critical_section::with(|cs| self.servo.borrow_ref_mut(cs).arm(direction, pulses));
    }

    pub fn cancel_servo(&self) {
        critical_section::with(|cs| self.servo.borrow_ref_mut(cs).cancel());
    }

    pub fn servo_active(&self) -> bool {
        critical_section::with(|cs| self.servo.borrow_ref(cs).is_active())
    }

    /// Mutate the display frame under the lock.
    pub fn with_display<R>(&self, f: impl FnOnce(&mut Frame) -> R) -> R {
        critical_section::with(|cs| f(&mut self.display.borrow_ref_mut(cs)))
    }
}

impl Default for TickShared {
    fn default() -> Self {
        Self::new()
    }
}

/// The one instance the timer callback and the hardware adapter share.
pub static SHARED: TickShared = TickShared::new();

/// Pin-level work the tick performs.
pub trait TickIo {
    /// Light `digit` with `segments` (all other digits off).
    fn drive_digit(&mut self, digit: usize, segments: u8);

    /// Blank the display.
    fn blank_display(&mut self);

    /// Set the servo output for the next 20 ms frame.
    fn drive_servo(&mut self, output: Option<Direction>);

    /// Raw button levels, MINUS / PLUS / ENTER, `true` = pressed.
    fn sample_buttons(&mut self) -> [bool; 3];

    /// Raw wheel sensor level, `true` = slot in view.
    fn sample_sensor(&mut self) -> bool;

    /// Collect the finished conversion and start the next one.
    fn adc_cycle(&mut self) -> u16;
}

/// Interrupt-context dispatcher.  Owned by the timer callback.
pub struct TickMultiplexer<'a, IO> {
    shared: &'a TickShared,
    io: IO,
    slow: u8,
}

impl<'a, IO: TickIo> TickMultiplexer<'a, IO> {
    pub const fn new(shared: &'a TickShared, io: IO) -> Self {
        Self { shared, io, slow: 0 }
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn on_tick(&mut self) {
        self.slow += 1;
        let slow_tick = self.slow >= SLOW_DIVIDER;
        if slow_tick {
            self.slow = 0;
        }

        if self.shared.mode() == PowerMode::Full {
            let digit = self.shared.with_display(Frame::next_digit);
            match digit {
                Some((digit, segments)) => self.io.drive_digit(digit, segments),
                None => self.io.blank_display(),
            }

            if slow_tick {
                let output = critical_section::with(|cs| self.shared.servo.borrow_ref_mut(cs).advance());
                self.io.drive_servo(output);
            }

            self.shared.buttons.update(self.io.sample_buttons());
            self.shared.sensor.update(self.io.sample_sensor());
        }

        if slow_tick {
            let sample = self.io.adc_cycle();
            critical_section::with(|cs| self.shared.battery.borrow_ref_mut(cs).update(sample));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::Button;

    #[derive(Default)]
    struct RecordingIo {
        digits: Vec<(usize, u8)>,
        servo: Vec<Option<Direction>>,
        buttons: [bool; 3],
        sensor: bool,
        adc_value: u16,
        adc_reads: usize,
    }

    impl TickIo for RecordingIo {
        fn drive_digit(&mut self, digit: usize, segments: u8) {
            self.digits.push((digit, segments));
        }
        fn blank_display(&mut self) {}
        fn drive_servo(&mut self, output: Option<Direction>) {
            self.servo.push(output);
        }
        fn sample_buttons(&mut self) -> [bool; 3] {
            self.buttons
        }
        fn sample_sensor(&mut self) -> bool {
            self.sensor
        }
        fn adc_cycle(&mut self) -> u16 {
            self.adc_reads += 1;
            self.adc_value
        }
    }

    #[test]
    fn full_mode_refreshes_every_tick() {
        let shared = TickShared::new();
        shared.with_display(|f| f.puts("123"));
        let mut mux = TickMultiplexer::new(&shared, RecordingIo::default());
        for _ in 0..6 {
            mux.on_tick();
        }
        let order: Vec<usize> = mux.io().digits.iter().map(|(d, _)| *d).collect();
        assert_eq!(order, [0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn servo_and_adc_run_every_eighth_tick() {
        let shared = TickShared::new();
        shared.arm_servo(Direction::Forward, 2);
        let mut mux = TickMultiplexer::new(&shared, RecordingIo::default());
        for _ in 0..24 {
            mux.on_tick();
        }
        assert_eq!(mux.io().servo, [Some(Direction::Forward), Some(Direction::Forward), None]);
        assert_eq!(mux.io().adc_reads, 3);
        assert!(!shared.servo_active());
    }

    #[test]
    fn low_power_only_samples_adc() {
        let shared = TickShared::new();
        shared.publish_mode(PowerMode::Low);
        shared.arm_servo(Direction::Forward, 2);
        let io = RecordingIo {
            buttons: [false, false, true],
            adc_value: 500,
            ..RecordingIo::default()
        };
        let mut mux = TickMultiplexer::new(&shared, io);
        for _ in 0..(8 * 64) {
            mux.on_tick();
        }
        assert!(mux.io().digits.is_empty());
        assert!(mux.io().servo.is_empty());
        assert_eq!(shared.buttons.read(), None);
        assert!(shared.servo_active());
        assert_eq!(shared.battery_raw(), 500);
    }

    #[test]
    fn button_press_reaches_main_loop() {
        let shared = TickShared::new();
        let io = RecordingIo {
            buttons: [false, true, false],
            ..RecordingIo::default()
        };
        let mut mux = TickMultiplexer::new(&shared, io);
        for _ in 0..4 {
            mux.on_tick();
        }
        assert_eq!(shared.buttons.read(), Some(Button::Plus));
        assert_eq!(shared.buttons.read(), None);
    }

    #[test]
    fn sensor_edge_is_latched() {
        let shared = TickShared::new();
        let mut mux = TickMultiplexer::new(&shared, RecordingIo::default());
        mux.on_tick();
        mux.io.sensor = true;
        mux.on_tick();
        assert!(shared.sensor.take());
    }
}
