//! Daily feeding schedule engine.
//!
//! Ten fixed slots, each `{hour, minute, servings}`.  Background processing
//! calls [`FeedingScheduler::check_due`] at most every 30 s with the wall
//! time read from the RTC.  A slot fires when the hour and minute match,
//! it is enabled, and it has not already fired on this day of the month.
//!
//! ```text
//!   RTC ──▶ WallTime ──▶ check_due ──[Some(servings)]──▶ dispense
//!                            │
//!                  last_triggered_day[i] = day
//! ```
//!
//! The per-slot day marker is the only history kept.  It is compared for
//! inequality, so a slot on the same day-of-month one month later still
//! fires.  Markers live in RAM and start empty at boot.

use log::info;

use crate::clock::WallTime;
use crate::settings::{ScheduleSlot, SLOT_COUNT};

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct FeedingScheduler {
    slots: [ScheduleSlot; SLOT_COUNT],
    /// Day of month each slot last fired; `None` = never since boot.
    last_triggered_day: [Option<u8>; SLOT_COUNT],
}

impl FeedingScheduler {
    pub fn new(slots: [ScheduleSlot; SLOT_COUNT]) -> Self {
        Self {
            slots,
            last_triggered_day: [None; SLOT_COUNT],
        }
    }

    pub fn slot(&self, index: usize) -> Option<ScheduleSlot> {
        self.slots.get(index).copied()
    }

    /// Replace one slot (clamped).  Its day marker is kept, so editing a
    /// slot that already fired today does not make it fire again.
    pub fn set_slot(&mut self, index: usize, slot: ScheduleSlot) -> bool {
        let Some(target) = self.slots.get_mut(index) else {
            return false;
        };
        *target = slot.clamped();
        true
    }

    pub fn last_triggered_day(&self, index: usize) -> Option<u8> {
        self.last_triggered_day.get(index).copied().flatten()
    }

    pub fn enabled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_enabled()).count()
    }

    /// Servings of the first due slot, marking it fired for `now.day`.
    pub fn check_due(&mut self, now: WallTime) -> Option<u8> {
        let (index, slot) = self
            .slots
            .iter()
            .enumerate()
            .find(|(i, s)| {
                s.is_enabled()
                    && s.hour == now.hour
                    && s.minute == now.minute
                    && self.last_triggered_day[*i] != Some(now.day)
            })
            .map(|(i, s)| (i, *s))?;

        self.last_triggered_day[index] = Some(now.day);
        info!(
            "Scheduler: slot {} due at {:02}:{:02} day {} ({} servings)",
            index + 1,
            now.hour,
            now.minute,
            now.day,
            slot.servings
        );
        Some(slot.servings)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn at(hour: u8, minute: u8, day: u8) -> WallTime {
        WallTime { hour, minute, day }
    }

    fn factory() -> FeedingScheduler {
        FeedingScheduler::new(Settings::default().slots)
    }

    #[test]
    fn fires_once_per_day() {
        let mut sched = factory();
        assert_eq!(sched.check_due(at(7, 0, 14)), Some(6));

        assert_eq!(sched.check_due(at(7, 0, 15)), Some(6));
        assert_eq!(sched.last_triggered_day(0), Some(15));
        // Second check inside the same minute.
        assert_eq!(sched.check_due(at(7, 0, 15)), None);
    }

    #[test]
    fn fires_again_next_day() {
        let mut sched = factory();
        assert_eq!(sched.check_due(at(17, 0, 3)), Some(6));
        assert_eq!(sched.check_due(at(17, 0, 4)), Some(6));
    }

    #[test]
    fn no_match_outside_slot_minute() {
        let mut sched = factory();
        assert_eq!(sched.check_due(at(7, 1, 15)), None);
        assert_eq!(sched.check_due(at(6, 59, 15)), None);
        assert_eq!(sched.last_triggered_day(0), None);
    }

    #[test]
    fn disabled_slot_never_fires() {
        let mut sched = factory();
        // Slot 3 is 00:00 with zero servings.
        assert_eq!(sched.check_due(at(0, 0, 1)), None);
        assert_eq!(sched.last_triggered_day(3), None);
    }

    #[test]
    fn first_matching_slot_wins() {
        let mut slots = [ScheduleSlot::DISABLED; SLOT_COUNT];
        slots[4] = ScheduleSlot::new(12, 0, 2);
        slots[7] = ScheduleSlot::new(12, 0, 9);
        let mut sched = FeedingScheduler::new(slots);

        assert_eq!(sched.check_due(at(12, 0, 1)), Some(2));
        // The duplicate fires on the next check in the same minute.
        assert_eq!(sched.check_due(at(12, 0, 1)), Some(9));
        assert_eq!(sched.check_due(at(12, 0, 1)), None);
    }

    #[test]
    fn set_slot_clamps_and_rejects_bad_index() {
        let mut sched = factory();
        assert!(sched.set_slot(9, ScheduleSlot::new(30, 75, 99)));
        assert_eq!(sched.slot(9), Some(ScheduleSlot::new(23, 59, 40)));
        assert!(!sched.set_slot(10, ScheduleSlot::new(1, 1, 1)));
        assert_eq!(sched.enabled_count(), 4);
    }
}
