//! The menu as data.
//!
//! ```text
//!  BAT ─ battery view
//!  CLK ─┬ HRS  0..23   (seconds zeroed)
//!       ├ MIN  0..59   (seconds zeroed)
//!       ├ DAY  1..31
//!       ├ MON  1..12
//!       └ YEA  0..99
//!  SCH ─ F 1 .. F10 ─┬ HRS  0..23
//!                    ├ MIN  0..59
//!                    └ SRV  0..40
//!  TST ─ test dispense
//!  CAL ─ calibration 750..850
//! ```

use crate::settings::{
    CALIBRATION_MAX, CALIBRATION_MIN, MAX_HOUR, MAX_MINUTE, MAX_SERVINGS, SLOT_COUNT,
};

/// A labelled entry of a menu level.
pub struct MenuItem {
    pub label: &'static str,
    pub node: MenuNode,
}

pub enum MenuNode {
    /// A nested level.
    Menu(&'static [MenuItem]),
    /// Pick a schedule slot, then browse `items` with that slot in scope.
    Slots(&'static [MenuItem]),
    Field(Field),
    Action(Action),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ShowBattery,
    TestDispense,
}

/// Every editable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SlotHour,
    SlotMinute,
    SlotServings,
    ClockHour,
    ClockMinute,
    ClockDay,
    ClockMonth,
    ClockYear,
    Calibration,
}

impl Field {
    /// Inclusive editing range.
    pub fn range(self) -> (u16, u16) {
        match self {
            Self::SlotHour | Self::ClockHour => (0, MAX_HOUR as u16),
            Self::SlotMinute | Self::ClockMinute => (0, MAX_MINUTE as u16),
            Self::SlotServings => (0, MAX_SERVINGS as u16),
            Self::ClockDay => (1, 31),
            Self::ClockMonth => (1, 12),
            Self::ClockYear => (0, 99),
            Self::Calibration => (CALIBRATION_MIN, CALIBRATION_MAX),
        }
    }

    #[cfg(test)]
    fn needs_slot(self) -> bool {
        matches!(self, Self::SlotHour | Self::SlotMinute | Self::SlotServings)
    }
}

pub const SLOT_LABELS: [&str; SLOT_COUNT] = ["F 1", "F 2", "F 3", "F 4", "F 5", "F 6", "F 7", "F 8", "F 9", "F10"];

pub static SLOT_FIELDS: [MenuItem; 3] = [
    MenuItem {
        label: "HRS",
        node: MenuNode::Field(Field::SlotHour),
    },
    MenuItem {
        label: "MIN",
        node: MenuNode::Field(Field::SlotMinute),
    },
    MenuItem {
        label: "SRV",
        node: MenuNode::Field(Field::SlotServings),
    },
];

pub static CLOCK_FIELDS: [MenuItem; 5] = [
    MenuItem {
        label: "HRS",
        node: MenuNode::Field(Field::ClockHour),
    },
    MenuItem {
        label: "MIN",
        node: MenuNode::Field(Field::ClockMinute),
    },
    MenuItem {
        label: "DAY",
        node: MenuNode::Field(Field::ClockDay),
    },
    MenuItem {
        label: "MON",
        node: MenuNode::Field(Field::ClockMonth),
    },
    MenuItem {
        label: "YEA",
        node: MenuNode::Field(Field::ClockYear),
    },
];

pub static TOP_MENU: [MenuItem; 5] = [
    MenuItem {
        label: "BAT",
        node: MenuNode::Action(Action::ShowBattery),
    },
    MenuItem {
        label: "CLK",
        node: MenuNode::Menu(&CLOCK_FIELDS),
    },
    MenuItem {
        label: "SCH",
        node: MenuNode::Slots(&SLOT_FIELDS),
    },
    MenuItem {
        label: "TST",
        node: MenuNode::Action(Action::TestDispense),
    },
    MenuItem {
        label: "CAL",
        node: MenuNode::Field(Field::Calibration),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fit_the_display() {
        let levels: [&[MenuItem]; 3] = [&TOP_MENU, &CLOCK_FIELDS, &SLOT_FIELDS];
        for item in levels.iter().flat_map(|l| l.iter()) {
            assert_eq!(item.label.len(), 3, "{}", item.label);
        }
        assert!(SLOT_LABELS.iter().all(|l| l.len() == 3));
    }

    #[test]
    fn slot_fields_only_under_slots() {
        for item in &TOP_MENU {
            if let MenuNode::Field(f) = item.node {
                assert!(!f.needs_slot());
            }
        }
        for item in &SLOT_FIELDS {
            assert!(matches!(item.node, MenuNode::Field(f) if f.needs_slot()));
        }
    }

    #[test]
    fn ranges() {
        assert_eq!(Field::Calibration.range(), (750, 850));
        assert_eq!(Field::ClockDay.range(), (1, 31));
        assert_eq!(Field::SlotServings.range(), (0, 40));
    }
}
