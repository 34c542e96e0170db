//! Tuning constants
//!
//! Everything musical or temporal about the toy lives here: which letters
//! exist, what they play, sequence/progression content, pacing windows, and
//! the speed-to-loudness curves. Fixed at startup; the wasm build accepts a
//! JSON override blob embedded in the page, but nothing is reconfigurable at
//! runtime.

use serde::{Deserialize, Serialize};

use crate::music::{Pitch, pitches};

/// Logarithmic speed-to-loudness mapping with a hard upper clamp.
///
/// `loudness = min(ceiling, offset + log10(speed + 1) * slope)`, in dB.
/// At speed 0 this evaluates to exactly `offset` (log10(1) = 0), so the
/// curve has a well-defined floor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoudnessCurve {
    /// Upper clamp in dB; fast impacts cannot exceed this.
    pub ceiling_db: f32,
    /// Value at speed 0, in dB.
    pub offset_db: f32,
    /// dB gained per decade of (speed + 1).
    pub slope_db: f32,
}

impl LoudnessCurve {
    pub fn loudness_db(&self, speed: f32) -> f32 {
        let speed = speed.max(0.0);
        let raw = self.offset_db + (speed + 1.0).log10() * self.slope_db;
        raw.min(self.ceiling_db)
    }
}

/// Startup tuning for the whole toy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Letter obstacles in display order, each with its assigned pitch.
    pub letters: Vec<(char, Pitch)>,
    /// Pitch rotation consumed by particle-particle collisions.
    pub particle_notes: Vec<Pitch>,
    /// Chord progression consumed by full-alphabet completion.
    pub chords: Vec<Vec<Pitch>>,

    /// How long a letter stays "armed" after a hit (ms).
    pub hit_expiry_ms: f64,
    /// Minimum gap between chord triggers (ms).
    pub chord_cooldown_ms: f64,
    /// Letter color flash duration (ms).
    pub flash_ms: f64,
    /// Container glow duration after a chord (ms).
    pub glow_ms: f64,

    /// Loudness curve for letter-particle hits.
    pub letter_curve: LoudnessCurve,
    /// Loudness curve for particle-particle hits (lower ceiling/slope).
    pub particle_curve: LoudnessCurve,
    /// Fixed chord loudness in dB.
    pub chord_loudness_db: f32,

    /// Single note duration (seconds).
    pub note_duration_s: f32,
    /// Chord duration (seconds); longer than single notes.
    pub chord_duration_s: f32,

    /// Auto-despawn age for particles, or `None` to keep them until an
    /// explicit clear.
    pub particle_lifetime_ms: Option<f64>,

    /// Master volume (0.0 - 1.0), applied on top of per-trigger loudness.
    pub master_volume: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        let letter_chars = ['I', 'W', 'L', 'Y', 'F'];
        let letter_notes = pitches(&["C4", "E4", "G4", "A4", "C5"]);
        Self {
            letters: letter_chars.into_iter().zip(letter_notes).collect(),
            particle_notes: pitches(&[
                "C4", "D4", "E4", "G4", "A4", "C5", "D5", "E5", "G5", "A5",
            ]),
            chords: vec![
                pitches(&["C4", "E4", "G4"]),
                pitches(&["G4", "B4", "D5"]),
                pitches(&["A3", "C4", "E4"]),
                pitches(&["F3", "A3", "C4"]),
            ],
            hit_expiry_ms: 7000.0,
            chord_cooldown_ms: 3500.0,
            flash_ms: 120.0,
            glow_ms: 850.0,
            letter_curve: LoudnessCurve {
                ceiling_db: -8.0,
                offset_db: -32.0,
                slope_db: 18.0,
            },
            particle_curve: LoudnessCurve {
                ceiling_db: -14.0,
                offset_db: -35.0,
                slope_db: 14.0,
            },
            chord_loudness_db: -9.0,
            note_duration_s: 0.3,
            chord_duration_s: 1.2,
            particle_lifetime_ms: None,
            master_volume: 1.0,
        }
    }
}

impl Tuning {
    /// Pitch assigned to a letter, if it is part of the alphabet.
    pub fn letter_pitch(&self, letter: char) -> Option<Pitch> {
        self.letters
            .iter()
            .find(|(c, _)| *c == letter)
            .map(|(_, p)| *p)
    }

    /// Number of letters in the alphabet.
    pub fn alphabet_len(&self) -> usize {
        self.letters.len()
    }

    /// Load tuning from an embedded `<script type="application/json">`
    /// element, falling back to defaults (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        // DOM element id holding an optional JSON override blob
        const OVERRIDE_ELEMENT_ID: &str = "chimefall-tuning";

        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(OVERRIDE_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = text {
            match serde_json::from_str(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from page");
                    return tuning;
                }
                Err(e) => log::warn!("Ignoring malformed tuning overrides: {e}"),
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_consistent() {
        let t = Tuning::default();
        assert_eq!(t.alphabet_len(), 5);
        assert!(!t.particle_notes.is_empty());
        assert!(!t.chords.is_empty());
        assert!(t.chords.iter().all(|c| !c.is_empty()));
        // Every letter resolves to a pitch
        for (c, _) in &t.letters {
            assert!(t.letter_pitch(*c).is_some());
        }
        assert_eq!(t.letter_pitch('Z'), None);
    }

    #[test]
    fn test_loudness_floor_and_ceiling() {
        let curve = Tuning::default().letter_curve;
        // Speed 0 hits the floor exactly, no NaN or -inf
        assert_eq!(curve.loudness_db(0.0), curve.offset_db);
        // Huge speeds clamp to the ceiling
        assert_eq!(curve.loudness_db(1e9), curve.ceiling_db);
    }

    #[test]
    fn test_override_parsing() {
        // A partial world: only some knobs changed, tables replaced
        let json = serde_json::to_string(&Tuning {
            hit_expiry_ms: 5000.0,
            master_volume: 0.6,
            ..Tuning::default()
        })
        .unwrap();
        let parsed: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.hit_expiry_ms, 5000.0);
        assert_eq!(parsed.master_volume, 0.6);
        assert_eq!(parsed.alphabet_len(), 5);
    }
}
