//! Persisted user settings: the ten-slot feeding schedule and the battery
//! calibration constant.
//!
//! Each slot is stored under its own key so an edit rewrites only that slot.
//! Values read back from storage are clamped into range before use; the
//! writers never store anything out of range, but flash can still hold an
//! image from an older firmware.

use serde::{Deserialize, Serialize};

/// Number of schedule slots.
pub const SLOT_COUNT: usize = 10;

pub const MAX_HOUR: u8 = 23;
pub const MAX_MINUTE: u8 = 59;
pub const MAX_SERVINGS: u8 = 40;

pub const CALIBRATION_MIN: u16 = 750;
pub const CALIBRATION_MAX: u16 = 850;
pub const CALIBRATION_DEFAULT: u16 = 799;

/// Encoded size of one slot (hour, minute, servings).
pub const SLOT_BLOB_LEN: usize = 3;
/// Upper bound on the encoded calibration (postcard varint u16).
pub const CALIBRATION_BLOB_LEN: usize = 3;

/// One daily feeding time.  `servings == 0` disables the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub hour: u8,
    pub minute: u8,
    pub servings: u8,
}

impl ScheduleSlot {
    pub const DISABLED: Self = Self {
        hour: 0,
        minute: 0,
        servings: 0,
    };

    pub const fn new(hour: u8, minute: u8, servings: u8) -> Self {
        Self {
            hour,
            minute,
            servings,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.servings != 0
    }

    /// Force every field into its declared range.
    pub fn clamped(self) -> Self {
        Self {
            hour: self.hour.min(MAX_HOUR),
            minute: self.minute.min(MAX_MINUTE),
            servings: self.servings.min(MAX_SERVINGS),
        }
    }

    pub fn encode(&self) -> Result<[u8; SLOT_BLOB_LEN], postcard::Error> {
        let mut buf = [0u8; SLOT_BLOB_LEN];
        postcard::to_slice(self, &mut buf)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes::<Self>(bytes).map(Self::clamped)
    }
}

/// Clamp a calibration constant into its editable range.
pub fn clamp_calibration(value: u16) -> u16 {
    value.clamp(CALIBRATION_MIN, CALIBRATION_MAX)
}

pub fn encode_calibration(value: u16) -> Result<heapless::Vec<u8, CALIBRATION_BLOB_LEN>, postcard::Error> {
    let mut buf = [0u8; CALIBRATION_BLOB_LEN];
    let used = postcard::to_slice(&value, &mut buf)?;
    heapless::Vec::from_slice(used).map_err(|_| postcard::Error::SerializeBufferFull)
}

pub fn decode_calibration(bytes: &[u8]) -> Result<u16, postcard::Error> {
    postcard::from_bytes::<u16>(bytes).map(clamp_calibration)
}

/// The complete persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub slots: [ScheduleSlot; SLOT_COUNT],
    pub calibration: u16,
}

impl Default for Settings {
    /// Factory image: three feedings a day, six servings each.
    fn default() -> Self {
        let mut slots = [ScheduleSlot::DISABLED; SLOT_COUNT];
        slots[0] = ScheduleSlot::new(7, 0, 6);
        slots[1] = ScheduleSlot::new(17, 0, 6);
        slots[2] = ScheduleSlot::new(22, 30, 6);
        Self {
            slots,
            calibration: CALIBRATION_DEFAULT,
        }
    }
}

impl Settings {
    /// Clamp every field; used after loading from storage.
    pub fn sanitized(mut self) -> Self {
        for slot in &mut self.slots {
            *slot = slot.clamped();
        }
        self.calibration = clamp_calibration(self.calibration);
        self
    }
}
