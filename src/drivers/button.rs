//! Tick-sampled button debouncer.
//!
//! ## Hardware
//!
//! Three active-low momentary switches with pull-ups.  The tick handler
//! samples each pin once per tick (see [`crate::tick`]) and feeds the
//! inverted level into [`ButtonDebouncer::update`]; the main loop consumes
//! presses with [`ButtonDebouncer::read`].
//!
//! ## Debounce
//!
//! The stable level flips only after the raw level has disagreed with it
//! for [`DEBOUNCE_TICKS`] consecutive ticks.  A single agreeing sample
//! restarts the count, so a glitch shorter than the window never registers.
//! A press sets an edge flag that `read()` consumes exactly once; holding
//! the button does not re-arm it.
//!
//! Every field is an atomic so one `static` instance can be written from
//! the tick and read from the main loop without a critical section.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::app::ports::Button;

/// Consecutive ticks (2.5 ms each) a level must hold to be trusted.
pub const DEBOUNCE_TICKS: u8 = 4;

pub struct ButtonDebouncer {
    window: u8,
    /// Consecutive samples that disagreed with `stable`.
    run: AtomicU8,
    stable: AtomicBool,
    edge: AtomicBool,
}

impl ButtonDebouncer {
    pub const fn new(window: u8) -> Self {
        Self {
            window,
            run: AtomicU8::new(0),
            stable: AtomicBool::new(false),
            edge: AtomicBool::new(false),
        }
    }

    /// Feed one sample (`true` = pressed).  Tick context only.
    pub fn update(&self, pressed: bool) {
        let stable = self.stable.load(Ordering::Relaxed);
        if pressed == stable {
            self.run.store(0, Ordering::Relaxed);
            return;
        }

        let run = self.run.load(Ordering::Relaxed).saturating_add(1);
        if run < self.window {
            self.run.store(run, Ordering::Relaxed);
            return;
        }

        self.run.store(0, Ordering::Relaxed);
        self.stable.store(pressed, Ordering::Relaxed);
        if pressed {
            self.edge.store(true, Ordering::Release);
        }
    }

    /// `true` once per confirmed press.
    pub fn read(&self) -> bool {
        self.edge.swap(false, Ordering::AcqRel)
    }

    /// Forget a pending press (e.g. one that arrived during a dispense).
    pub fn clear(&self) {
        self.edge.store(false, Ordering::Release);
    }

    /// Debounced level.
    pub fn is_held(&self) -> bool {
        self.stable.load(Ordering::Relaxed)
    }
}

/// The feeder's three buttons.
pub struct ButtonBank {
    pub minus: ButtonDebouncer,
    pub plus: ButtonDebouncer,
    pub enter: ButtonDebouncer,
}

impl ButtonBank {
    pub const fn new() -> Self {
        Self {
            minus: ButtonDebouncer::new(DEBOUNCE_TICKS),
            plus: ButtonDebouncer::new(DEBOUNCE_TICKS),
            enter: ButtonDebouncer::new(DEBOUNCE_TICKS),
        }
    }

    /// Feed one sample per button, in MINUS / PLUS / ENTER order.
    pub fn update(&self, pressed: [bool; 3]) {
        self.minus.update(pressed[0]);
        self.plus.update(pressed[1]);
        self.enter.update(pressed[2]);
    }

    /// Consume one press, MINUS first.  Lower-priority edges stay pending.
    pub fn read(&self) -> Option<Button> {
        if self.minus.read() {
            Some(Button::Minus)
        } else if self.plus.read() {
            Some(Button::Plus)
        } else if self.enter.read() {
            Some(Button::Enter)
        } else {
            None
        }
    }

    pub fn clear(&self) {
        self.minus.clear();
        self.plus.clear();
        self.enter.clear();
    }
}

impl Default for ButtonBank {
    fn default() -> Self {
        Self::new()
    }
}
