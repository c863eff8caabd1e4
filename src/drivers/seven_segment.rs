//! Three-digit multiplexed seven-segment display.
//!
//! ## Hardware
//!
//! Common-cathode digits share the A..G segment lines; one cathode is
//! pulled low at a time.  The tick lights one digit per call
//! ([`Frame::next_digit`]), so a full frame takes three ticks (7.5 ms).
//!
//! ## Text model
//!
//! The frame is a tiny terminal: characters are written at a cursor that
//! wraps after the third position, `'\r'` homes the cursor, and `'\n'`
//! blanks the frame and homes the cursor.  Characters without a glyph show
//! as a blank digit.  Lower-case letters use the upper-case glyph.

/// Segment bit for each of A..G (bit 0 = A).
pub const SEG_G: u8 = 0x40;

/// Glyph table.  Letters that cannot be drawn in upper case use the
/// lower-case shape (b, c, d, h, n, o, r, t, u).
const FONT: &[(u8, u8)] = &[
    (b' ', 0x00),
    (b'-', SEG_G),
    (b'0', 0x3f),
    (b'1', 0x06),
    (b'2', 0x5b),
    (b'3', 0x4f),
    (b'4', 0x66),
    (b'5', 0x6d),
    (b'6', 0x7d),
    (b'7', 0x07),
    (b'8', 0x7f),
    (b'9', 0x6f),
    (b'A', 0x77),
    (b'B', 0x7c),
    (b'C', 0x39),
    (b'D', 0x5e),
    (b'E', 0x79),
    (b'F', 0x71),
    (b'G', 0x3d),
    (b'H', 0x74),
    (b'I', 0x04),
    (b'J', 0x04),
    (b'K', 0x76),
    (b'L', 0x38),
    (b'M', 0x37),
    (b'N', 0x54),
    (b'O', 0x5c),
    (b'P', 0x73),
    (b'Q', 0x5c),
    (b'R', 0x50),
    (b'S', 0x6d),
    (b'T', 0x78),
    (b'U', 0x1c),
    (b'V', 0x1c),
    (b'W', 0x3e),
    (b'X', 0x76),
    (b'Y', 0x6e),
    (b'Z', 0x5b),
];

pub const DIGITS: usize = 3;

/// Segment pattern for `c`, or blank.
pub fn glyph(c: u8) -> u8 {
    let c = c.to_ascii_uppercase();
    FONT.iter()
        .find(|(ch, _)| *ch == c)
        .map_or(0, |(_, bits)| *bits)
}

/// Display contents plus the write cursor and the refresh position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    segments: [u8; DIGITS],
    cursor: u8,
    scan: u8,
    enabled: bool,
}

impl Frame {
    pub const fn new() -> Self {
        Self {
            segments: [0; DIGITS],
            cursor: 0,
            scan: 0,
            enabled: true,
        }
    }

    pub fn putc(&mut self, c: u8) {
        match c {
            b'\r' => self.cursor = 0,
            b'\n' => {
                self.segments = [0; DIGITS];
                self.cursor = 0;
            }
            _ => {
                self.segments[self.cursor as usize] = glyph(c);
                self.cursor = (self.cursor + 1) % DIGITS as u8;
            }
        }
    }

    pub fn puts(&mut self, text: &str) {
        for c in text.bytes() {
            self.putc(c);
        }
    }

    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last three decimal digits, zero padded.
    pub fn print_decimal(&mut self, value: u16) {
        self.putc(b'\r');
        self.putc(b'0' + ((value % 1000) / 100) as u8);
        self.putc(b'0' + ((value % 100) / 10) as u8);
        self.putc(b'0' + (value % 10) as u8);
    }

    /// Low three hex nibbles.
    pub fn print_hex(&mut self, value: u16) {
        self.cursor = 0;
        for shift in [8u16, 4, 0] {
            let nibble = ((value >> shift) & 0x0f) as u8;
            let c = if nibble < 10 {
                b'0' + nibble
            } else {
                b'A' + nibble - 10
            };
            self.putc(c);
        }
    }

    pub fn segments(&self) -> [u8; DIGITS] {
        self.segments
    }

    /// Advance the refresh scan: the digit to light and its segments.
    /// `None` while the display is off.
    pub fn next_digit(&mut self) -> Option<(usize, u8)> {
        if !self.enabled {
            return None;
        }
        let digit = self.scan as usize;
        self.scan = (self.scan + 1) % DIGITS as u8;
        Some((digit, self.segments[digit]))
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

// ── Pin driver ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Blank every digit (cathodes high).
#[cfg(target_os = "espidf")]
pub fn blank_digits() {
    for &pin in &pins::DIGIT_GPIOS {
        hw_init::gpio_write(pin, true);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn blank_digits() {}

/// Light `digit` with `segments`.  Called from the tick only.
#[cfg(target_os = "espidf")]
pub fn drive_digit(digit: usize, segments: u8) {
    blank_digits();
    for (bit, &pin) in pins::SEGMENT_GPIOS.iter().enumerate() {
        hw_init::gpio_write(pin, segments & (1 << bit) != 0);
    }
    if let Some(&cathode) = pins::DIGIT_GPIOS.get(digit) {
        hw_init::gpio_write(cathode, false);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn drive_digit(_digit: usize, _segments: u8) {}
