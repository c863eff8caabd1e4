//! Fuzz target: persisted settings decoding
//!
//! Feeds arbitrary blobs to the slot and calibration decoders that run on
//! every boot against whatever flash holds.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A decoded slot is always within hour/minute/servings range
//! - A decoded calibration is always within 750..=850
//!
//! cargo fuzz run fuzz_settings_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::settings::{
    decode_calibration, ScheduleSlot, CALIBRATION_MAX, CALIBRATION_MIN, MAX_HOUR, MAX_MINUTE,
    MAX_SERVINGS,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(slot) = ScheduleSlot::decode(data) {
        assert!(slot.hour <= MAX_HOUR);
        assert!(slot.minute <= MAX_MINUTE);
        assert!(slot.servings <= MAX_SERVINGS);
        assert_eq!(slot.clamped(), slot);
    }

    if let Ok(value) = decode_calibration(data) {
        assert!((CALIBRATION_MIN..=CALIBRATION_MAX).contains(&value));
    }
});
