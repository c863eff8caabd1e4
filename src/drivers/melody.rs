//! RTTTL ring-tone parser and speaker player.
//!
//! A score looks like `name:d=4,o=5,b=160:8e7,8d#7,2a6,`: a name, the
//! defaults section (duration, octave, beats per minute) and a comma
//! separated note list.  Each note is
//! `[duration] letter [#] [.] [octave] [.]`; `p` is a pause.  Scores found
//! in the wild often put the dot before the octave digit, so both positions
//! are accepted.
//!
//! [`Rtttl::parse`] validates only the two section separators.  Anything
//! odd inside the note list degrades to a silent note rather than an error.

use embedded_hal::delay::DelayNs;

const DEFAULT_DURATION: u16 = 4;
const DEFAULT_OCTAVE: u16 = 6;
const DEFAULT_BPM: u16 = 63;

/// Note frequencies (Hz) for octaves 5..=8, C through B.
const FREQUENCIES: [[u16; 12]; 4] = [
    [262, 277, 294, 311, 330, 349, 370, 392, 415, 440, 466, 494],
    [523, 554, 587, 622, 659, 698, 740, 784, 831, 880, 932, 988],
    [1047, 1109, 1175, 1245, 1319, 1397, 1480, 1568, 1661, 1760, 1865, 1976],
    [2093, 2217, 2349, 2489, 2637, 2794, 2960, 3136, 3322, 3520, 3729, 3951],
];

/// One tone: `frequency_hz == 0` is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub frequency_hz: u16,
    pub duration_ms: u32,
}

/// Iterator over the notes of a score.
#[derive(Debug, Clone)]
pub struct Rtttl<'a> {
    rest: &'a [u8],
    duration: u16,
    octave: u16,
    bpm: u16,
}

impl<'a> Rtttl<'a> {
    /// `None` when either section separator is missing.
    pub fn parse(score: &'a str) -> Option<Self> {
        let bytes = score.as_bytes();
        let name_end = bytes.iter().position(|&b| b == b':')?;
        let after_name = &bytes[name_end + 1..];
        let defaults_end = after_name.iter().position(|&b| b == b':')?;

        let mut melody = Self {
            rest: &after_name[defaults_end + 1..],
            duration: DEFAULT_DURATION,
            octave: DEFAULT_OCTAVE,
            bpm: DEFAULT_BPM,
        };
        melody.parse_defaults(&after_name[..defaults_end]);
        Some(melody)
    }

    fn parse_defaults(&mut self, mut section: &[u8]) {
        while let Some((&key, tail)) = section.split_first() {
            section = tail;
            let target = match key {
                b'd' => &mut self.duration,
                b'o' => &mut self.octave,
                b'b' => &mut self.bpm,
                _ => continue,
            };
            let (value, tail) = take_value(section);
            section = tail;
            if value != 0 {
                *target = value;
            }
        }
    }
}

/// Read a decimal value, skipping `=` and spaces mixed into it.
fn take_value(mut s: &[u8]) -> (u16, &[u8]) {
    let mut value: u16 = 0;
    while let Some((&c, tail)) = s.split_first() {
        match c {
            b'0'..=b'9' => value = value.saturating_mul(10).saturating_add((c - b'0') as u16),
            b'=' | b' ' => {}
            _ => break,
        }
        s = tail;
    }
    (value, s)
}

fn take_digits(s: &[u8]) -> (Option<u16>, &[u8]) {
    if s.first().is_some_and(u8::is_ascii_digit) {
        let (v, tail) = take_value(s);
        (Some(v), tail)
    } else {
        (None, s)
    }
}

fn frequency(letter: u8, sharp: bool, octave: u16) -> u16 {
    let semitone: usize = match letter {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' | b'H' => 11,
        _ => return 0,
    };
    let index = if sharp { semitone + 1 } else { semitone };
    match octave {
        5..=8 => FREQUENCIES[(octave - 5) as usize].get(index).copied().unwrap_or(0),
        _ => 0,
    }
}

impl Iterator for Rtttl<'_> {
    type Item = Note;

    fn next(&mut self) -> Option<Note> {
        let mut s = self.rest;
        while let Some((b',' | b' ', tail)) = s.split_first() {
            s = tail;
        }

        let (duration, tail) = take_digits(s);
        s = tail;
        let (&letter, tail) = s.split_first()?;
        s = tail;
        let letter = letter.to_ascii_uppercase();

        let mut sharp = false;
        if let Some((b'#', tail)) = s.split_first() {
            sharp = true;
            s = tail;
        }
        let mut dotted = false;
        if let Some((b'.', tail)) = s.split_first() {
            dotted = true;
            s = tail;
        }
        let (octave, tail) = take_digits(s);
        s = tail;
        if let Some((b'.', tail)) = s.split_first() {
            dotted = true;
            s = tail;
        }
        self.rest = s;

        let divisor = duration.filter(|&d| d != 0).unwrap_or(self.duration).max(1) as u32;
        let mut duration_ms = 60_000 / self.bpm.max(1) as u32 * 4 / divisor;
        if dotted {
            duration_ms = duration_ms * 3 / 2;
        }

        Some(Note {
            frequency_hz: frequency(letter, sharp, octave.unwrap_or(self.octave)),
            duration_ms,
        })
    }
}

// ── Speaker ───────────────────────────────────────────────────

/// Piezo speaker on an LEDC channel.
pub struct Speaker;

impl Speaker {
    /// Start a square wave at `frequency_hz`; 0 silences.
    pub fn tone(&mut self, frequency_hz: u16) {
        if frequency_hz == 0 {
            crate::drivers::hw_init::speaker_silence();
        } else {
            crate::drivers::hw_init::speaker_tone(frequency_hz as u32);
        }
    }

    pub fn off(&mut self) {
        crate::drivers::hw_init::speaker_silence();
    }

    /// Play a whole score.  `between_notes` runs after each note (the
    /// caller feeds the watchdog there).
    pub fn play(&mut self, score: &str, delay: &mut impl DelayNs, mut between_notes: impl FnMut()) {
        let Some(notes) = Rtttl::parse(score) else {
            log::warn!("melody: malformed score ignored");
            return;
        };
        for note in notes {
            self.tone(note.frequency_hz);
            delay.delay_ms(note.duration_ms);
            self.off();
            between_notes();
        }
    }
}
