//! Fuzz target: `Rtttl::parse` and its note iterator
//!
//! Scores are compile-time constants today, but the parser walks raw bytes
//! and must stay total:
//! - No panics under any byte sequence
//! - Every note consumes input, so iteration ends within `len` notes
//! - Frequencies are either a rest or inside the four supported octaves
//!
//! cargo fuzz run fuzz_rtttl

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::drivers::melody::Rtttl;

fuzz_target!(|data: &[u8]| {
    let Ok(score) = core::str::from_utf8(data) else {
        return;
    };
    let Some(notes) = Rtttl::parse(score) else {
        return;
    };

    let mut count = 0usize;
    for note in notes.take(score.len() + 1) {
        count += 1;
        assert!(
            note.frequency_hz == 0 || (262..=3951).contains(&note.frequency_hz),
            "frequency out of range: {}",
            note.frequency_hz
        );
    }
    assert!(count <= score.len(), "iterator did not consume input");
});
