//! DS1302 trickle-charge timekeeping chip.
//!
//! ## Protocol
//!
//! Three wires: CE, SCLK and a bidirectional I/O line.  Each transfer is a
//! command byte (register address, bit 0 set for reads) followed by one data
//! byte, both LSB first.  Calendar registers hold packed BCD.
//!
//! | Write | Read | Register                           |
//! |-------|------|------------------------------------|
//! | 0x80  | 0x81 | seconds (bit 7 = clock halt)       |
//! | 0x82  | 0x83 | minutes                            |
//! | 0x84  | 0x85 | hours (bit 7 = 12h mode, unused)   |
//! | 0x86  | 0x87 | date                               |
//! | 0x88  | 0x89 | month                              |
//! | 0x8a  | 0x8b | weekday                            |
//! | 0x8c  | 0x8d | year                               |
//! | 0x8e  | 0x8f | control (bit 7 = write protect)    |
//! | 0x90  | 0x91 | trickle charger                    |
//!
//! Every write sequence clears write-protect first and sets it again last.
//! BCD never leaves this module.

use crate::clock::DateTime;

const REG_SECONDS: u8 = 0x80;
const REG_MINUTES: u8 = 0x82;
const REG_HOURS: u8 = 0x84;
const REG_DATE: u8 = 0x86;
const REG_MONTH: u8 = 0x88;
const REG_WEEKDAY: u8 = 0x8a;
const REG_YEAR: u8 = 0x8c;
const REG_CONTROL: u8 = 0x8e;
const REG_TRICKLE: u8 = 0x90;

const CLOCK_HALT: u8 = 0x80;
const WRITE_PROTECT: u8 = 0x80;
/// One diode, 2 kΩ.
const TRICKLE_ONE_DIODE_2K: u8 = 0xa5;

/// Date the clock is reset to when found halted: 2016-07-10 00:00:00, Sunday.
pub const RESET_DATE_TIME: DateTime = DateTime {
    year: 16,
    month: 7,
    day: 10,
    hour: 0,
    minute: 0,
    second: 0,
    weekday: 7,
};

pub fn from_bcd(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0f)
}

pub fn to_bcd(bin: u8) -> u8 {
    ((bin / 10) << 4) | (bin % 10)
}

/// Register-level access to the chip.  `address` is always the write
/// (even) address; the bus sets the read bit itself.
pub trait Ds1302Bus {
    fn read_register(&mut self, address: u8) -> u8;

    fn write_register(&mut self, address: u8, value: u8);
}

pub struct Ds1302<B: Ds1302Bus> {
    bus: B,
}

impl<B: Ds1302Bus> Ds1302<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn write_unprotected(&mut self, writes: &[(u8, u8)]) {
        self.bus.write_register(REG_CONTROL, 0);
        for &(address, value) in writes {
            self.bus.write_register(address, value);
        }
        self.bus.write_register(REG_CONTROL, WRITE_PROTECT);
    }

    pub fn read_date_time(&mut self) -> DateTime {
        DateTime {
            second: from_bcd(self.bus.read_register(REG_SECONDS) & 0x7f),
            minute: from_bcd(self.bus.read_register(REG_MINUTES)),
            hour: from_bcd(self.bus.read_register(REG_HOURS) & 0x3f),
            day: from_bcd(self.bus.read_register(REG_DATE)),
            month: from_bcd(self.bus.read_register(REG_MONTH)),
            weekday: from_bcd(self.bus.read_register(REG_WEEKDAY)),
            year: from_bcd(self.bus.read_register(REG_YEAR)),
        }
    }

    /// Seconds since midnight; reads only the three time registers.
    pub fn read_day_seconds(&mut self) -> u32 {
        let second = from_bcd(self.bus.read_register(REG_SECONDS) & 0x7f) as u32;
        let minute = from_bcd(self.bus.read_register(REG_MINUTES)) as u32;
        let hour = from_bcd(self.bus.read_register(REG_HOURS) & 0x3f) as u32;
        hour * 3600 + minute * 60 + second
    }

    /// Write every calendar register.  Writing the seconds register also
    /// clears the clock-halt bit, starting the oscillator.
    pub fn write_date_time(&mut self, dt: &DateTime) {
        self.write_unprotected(&[
            (REG_SECONDS, to_bcd(dt.second) & 0x7f),
            (REG_MINUTES, to_bcd(dt.minute)),
            (REG_HOURS, to_bcd(dt.hour)),
            (REG_DATE, to_bcd(dt.day)),
            (REG_MONTH, to_bcd(dt.month)),
            (REG_WEEKDAY, to_bcd(dt.weekday)),
            (REG_YEAR, to_bcd(dt.year)),
        ]);
    }

    pub fn enable_charging(&mut self) {
        self.write_unprotected(&[(REG_TRICKLE, TRICKLE_ONE_DIODE_2K)]);
    }

    pub fn disable_charging(&mut self) {
        self.write_unprotected(&[(REG_TRICKLE, 0)]);
    }

    pub fn is_halted(&mut self) -> bool {
        self.bus.read_register(REG_SECONDS) & CLOCK_HALT != 0
    }

    /// Restart a halted clock from [`RESET_DATE_TIME`].  Returns `true`
    /// if a reset was needed.
    pub fn ensure_running(&mut self) -> bool {
        if !self.is_halted() {
            return false;
        }
        log::warn!("ds1302: clock was halted, resetting to 16-07-10 00:00");
        self.write_date_time(&RESET_DATE_TIME);
        true
    }
}

// ── Bit-banged GPIO bus ───────────────────────────────────────

#[cfg(target_os = "espidf")]
mod gpio_bus {
    use super::Ds1302Bus;
    use crate::drivers::hw_init;
    use crate::pins;

    /// CE/SCLK/IO on plain GPIOs.  The chip needs ≥1 µs around clock
    /// edges at 2 V; 2 µs keeps margin at any supply.
    pub struct GpioBus;

    const EDGE_US: u32 = 2;

    impl GpioBus {
        fn clock_high(&self) {
            hw_init::gpio_write(pins::RTC_CLK_GPIO, true);
            hw_init::delay_us(EDGE_US);
        }

        fn clock_low(&self) {
            hw_init::gpio_write(pins::RTC_CLK_GPIO, false);
            hw_init::delay_us(EDGE_US);
        }

        fn start(&self) {
            hw_init::gpio_write(pins::RTC_CLK_GPIO, false);
            hw_init::gpio_write(pins::RTC_CE_GPIO, false);
            hw_init::gpio_set_output(pins::RTC_IO_GPIO, true);
            hw_init::gpio_write(pins::RTC_IO_GPIO, false);
            hw_init::gpio_write(pins::RTC_CE_GPIO, true);
            hw_init::delay_us(EDGE_US * 2);
        }

        fn stop(&self) {
            hw_init::gpio_write(pins::RTC_CLK_GPIO, false);
            hw_init::gpio_write(pins::RTC_CE_GPIO, false);
            hw_init::delay_us(EDGE_US * 2);
        }

        /// Shift out LSB first, leaving SCLK high after the last bit.
        fn send(&self, mut byte: u8) {
            for bit in 0..8 {
                hw_init::gpio_write(pins::RTC_IO_GPIO, byte & 1 != 0);
                self.clock_high();
                byte >>= 1;
                if bit < 7 {
                    self.clock_low();
                }
            }
        }

        fn receive(&self) -> u8 {
            let mut byte = 0u8;
            for _ in 0..8 {
                byte >>= 1;
                if hw_init::gpio_read(pins::RTC_IO_GPIO) {
                    byte |= 0x80;
                }
                self.clock_high();
                self.clock_low();
            }
            byte
        }
    }

    impl Ds1302Bus for GpioBus {
        fn read_register(&mut self, address: u8) -> u8 {
            self.start();
            self.send(address | 1);
            hw_init::gpio_set_output(pins::RTC_IO_GPIO, false);
            self.clock_low();
            let value = self.receive();
            self.stop();
            hw_init::gpio_set_output(pins::RTC_IO_GPIO, true);
            value
        }

        fn write_register(&mut self, address: u8, value: u8) {
            self.start();
            self.send(address & !1);
            self.clock_low();
            self.send(value);
            self.clock_low();
            self.stop();
        }
    }
}

#[cfg(target_os = "espidf")]
pub use gpio_bus::GpioBus;

// ── Simulated register file ───────────────────────────────────

/// Host stand-in: a register file that starts halted, like a chip fresh
/// out of the reel.  Time does not advance on its own.
#[cfg(not(target_os = "espidf"))]
pub struct SimBus {
    registers: [u8; 32],
}

#[cfg(not(target_os = "espidf"))]
impl SimBus {
    pub fn new() -> Self {
        let mut registers = [0u8; 32];
        registers[0] = CLOCK_HALT;
        Self { registers }
    }

    fn slot(address: u8) -> usize {
        ((address & 0x3e) >> 1) as usize
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[Self::slot(address)]
    }

    pub fn write_protected(&self) -> bool {
        self.register(REG_CONTROL) & WRITE_PROTECT != 0
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Ds1302Bus for SimBus {
    fn read_register(&mut self, address: u8) -> u8 {
        self.registers[Self::slot(address)]
    }

    fn write_register(&mut self, address: u8, value: u8) {
        // Only the control register is writable while protected.
        if address != REG_CONTROL && self.write_protected() {
            return;
        }
        self.registers[Self::slot(address)] = value;
    }
}
