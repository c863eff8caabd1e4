//! Bounded numeric editor and the idle-timed wait loops the menu is built
//! from.
//!
//! Every loop here follows the same shape: feed the keep-alive, check the
//! idle timer, consume at most one button press, otherwise sleep until the
//! next interrupt.  The idle timer is measured in RTC day-seconds because
//! it must survive the tick being stopped.

use crate::app::ports::{Button, ButtonPort, DisplayPort, IdlePort, KeepAlive, RtcPort};
use crate::clock::IdleTimer;

/// Everything a menu wait loop touches.
pub trait MenuIo: RtcPort + DisplayPort + ButtonPort + IdlePort + KeepAlive {}

impl<T> MenuIo for T where T: RtcPort + DisplayPort + ButtonPort + IdlePort + KeepAlive {}

/// A value clamped to `min..=max`.  MINUS and PLUS stop at the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueEditor {
    value: u16,
    min: u16,
    max: u16,
}

/// Result of feeding one press to an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// MINUS or PLUS; the value may or may not have moved.
    Adjusted,
    /// ENTER.
    Commit(u16),
}

impl ValueEditor {
    /// The starting value is clamped into range.
    pub fn new(value: u16, min: u16, max: u16) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn press(&mut self, button: Button) -> Edit {
        match button {
            Button::Plus => {
                if self.value < self.max {
                    self.value += 1;
                }
                Edit::Adjusted
            }
            Button::Minus => {
                if self.value > self.min {
                    self.value -= 1;
                }
                Edit::Adjusted
            }
            Button::Enter => Edit::Commit(self.value),
        }
    }
}

/// Edit a value on the display.  `Some` on ENTER; `None` after
/// `timeout_secs` without a press, leaving the caller's value untouched.
pub fn edit_value<H: MenuIo>(hw: &mut H, initial: u16, min: u16, max: u16, timeout_secs: u32) -> Option<u16> {
    let mut editor = ValueEditor::new(initial, min, max);
    let mut timer = IdleTimer::start(hw, timeout_secs);
    hw.show_decimal(editor.value());

    loop {
        hw.feed();
        if timer.expired(hw) {
            return None;
        }
        match hw.read_button() {
            Some(button) => match editor.press(button) {
                Edit::Commit(value) => return Some(value),
                Edit::Adjusted => {
                    timer.touch(hw);
                    hw.show_decimal(editor.value());
                }
            },
            None => hw.wait_for_interrupt(),
        }
    }
}

/// Browse `count` labelled entries starting at `*cursor`.  Returns the
/// entry chosen with ENTER, or `None` after `timeout_secs` of silence.
/// The cursor keeps its position for the next call.
pub fn choose<H: MenuIo>(
    hw: &mut H,
    count: usize,
    label: impl Fn(usize) -> &'static str,
    cursor: &mut usize,
    timeout_secs: u32,
) -> Option<usize> {
    if count == 0 {
        return None;
    }
    *cursor = (*cursor).min(count - 1);
    let mut timer = IdleTimer::start(hw, timeout_secs);
    hw.set_text(label(*cursor));

    loop {
        hw.feed();
        if timer.expired(hw) {
            return None;
        }
        match hw.read_button() {
            Some(Button::Plus) => {
                if *cursor + 1 < count {
                    *cursor += 1;
                }
                timer.touch(hw);
                hw.set_text(label(*cursor));
            }
            Some(Button::Minus) => {
                *cursor = cursor.saturating_sub(1);
                timer.touch(hw);
                hw.set_text(label(*cursor));
            }
            Some(Button::Enter) => return Some(*cursor),
            None => hw.wait_for_interrupt(),
        }
    }
}

/// Wait for any press, at most `timeout_secs`.  Returns the press.
pub fn wait_for_press<H: MenuIo>(hw: &mut H, timeout_secs: u32) -> Option<Button> {
    let timer = IdleTimer::start(hw, timeout_secs);
    loop {
        hw.feed();
        if let Some(button) = hw.read_button() {
            return Some(button);
        }
        if timer.expired(hw) {
            return None;
        }
        hw.wait_for_interrupt();
    }
}
