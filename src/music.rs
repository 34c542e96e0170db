//! Pitch representation and note-name parsing
//!
//! Pitches are stored as MIDI note numbers so the audio layer can derive
//! oscillator frequencies, while tuning tables stay readable ("C4", "F#3").

use serde::{Deserialize, Serialize};
use std::fmt;

/// A musical pitch as a MIDI note number (60 = middle C, 69 = A4 = 440 Hz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch(pub u8);

impl Pitch {
    /// Parse a note name like "C4", "F#3" or "Bb2".
    ///
    /// Octave numbering follows scientific pitch notation (C4 = MIDI 60).
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let base: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest: String = chars.collect();
        let (accidental, octave_str) = match rest.chars().next()? {
            '#' => (1, &rest[1..]),
            'b' => (-1, &rest[1..]),
            _ => (0, rest.as_str()),
        };

        let octave: i32 = octave_str.parse().ok()?;
        let midi = (octave + 1) * 12 + base + accidental;
        u8::try_from(midi).ok().map(Pitch)
    }

    /// Frequency in Hz (equal temperament, A4 = 440 Hz).
    pub fn frequency_hz(self) -> f32 {
        440.0 * 2f32.powf((self.0 as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        let name = NAMES[(self.0 % 12) as usize];
        let octave = (self.0 / 12) as i32 - 1;
        write!(f, "{name}{octave}")
    }
}

/// Parse a list of note names, panicking on malformed input.
///
/// Only used to build tuning tables from compile-time literals, where a typo
/// should fail loudly at startup.
pub fn pitches(names: &[&str]) -> Vec<Pitch> {
    names
        .iter()
        .map(|n| Pitch::parse(n).unwrap_or_else(|| panic!("bad note name: {n}")))
        .collect()
}
