//! Collision-to-sound mapping and chord completion
//!
//! One `on_collision_batch` call per physics step that produced new
//! contacts, one `advance` call per animation frame to drain timed effects.

use std::collections::HashMap;

use crate::config::Tuning;
use crate::music::Pitch;

use super::state::{ActivationState, ContactPair, Participant};

/// A command for the audio/visual collaborators.
///
/// The engine never calls into Web Audio or the DOM; the host applies these
/// in order, fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Trigger a single pitch on the main voice.
    Note {
        pitch: Pitch,
        duration_s: f32,
        loudness_db: f32,
    },
    /// Trigger a simultaneous chord on the chord voice.
    Chord {
        pitches: Vec<Pitch>,
        duration_s: f32,
        loudness_db: f32,
    },
    /// Swap a letter's display color to the highlight color.
    Flash { letter: char },
    /// Restore a letter's base display color.
    Unflash { letter: char },
    /// Start the container glow.
    GlowOn,
    /// Revert the container glow.
    GlowOff,
}

/// The interaction reward engine: hit-tracking set, progression cursors,
/// cooldown timestamp, and pending restore deadlines.
pub struct RewardEngine {
    tuning: Tuning,
    activation: ActivationState,
    /// Letter -> expiry deadline (ms). Membership means "armed".
    hits: HashMap<char, f64>,
    /// Letter -> flash restore deadline (ms). A later hit overwrites the
    /// deadline, so an earlier restore can never clobber a newer flash.
    flash_until: HashMap<char, f64>,
    glow_until: Option<f64>,
    particle_cursor: usize,
    chord_cursor: usize,
    last_chord_ms: f64,
}

impl RewardEngine {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            activation: ActivationState::default(),
            hits: HashMap::new(),
            flash_until: HashMap::new(),
            glow_until: None,
            particle_cursor: 0,
            chord_cursor: 0,
            last_chord_ms: f64::NEG_INFINITY,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Record a user interaction; true means the host should ask the audio
    /// context to resume. Idempotent while a request is in flight.
    pub fn request_activation(&mut self) -> bool {
        self.activation.request()
    }

    /// Record the outcome of an activation request.
    pub fn activation_result(&mut self, ok: bool) {
        self.activation.complete(ok);
        if ok {
            log::info!("Audio activated");
        } else {
            log::warn!("Audio activation failed; next tap retries");
        }
    }

    pub fn activation(&self) -> ActivationState {
        self.activation
    }

    /// Number of currently armed letters (for overlays/tests).
    pub fn armed_count(&self) -> usize {
        self.hits.len()
    }

    /// Process one physics step's worth of new contacts.
    ///
    /// No-op unless audio was activated AND the host reports its output
    /// context as currently running (`output_running`). A context can be
    /// suspended again after activation (hidden tab, OS interruption), and
    /// any trigger would be dropped then; skipping the whole batch keeps
    /// cursors and the chord cooldown from advancing inaudibly.
    pub fn on_collision_batch(
        &mut self,
        now_ms: f64,
        pairs: &[ContactPair],
        output_running: bool,
    ) -> Vec<Effect> {
        if !self.activation.is_active() || !output_running {
            return Vec::new();
        }

        // Lapsed entries must not count toward completion even if the host
        // skipped advance() calls this frame.
        self.hits.retain(|_, deadline| *deadline > now_ms);

        let mut effects = Vec::new();
        let mut new_letter_hit = false;

        for pair in pairs {
            match Self::classify(pair) {
                Classified::LetterHit { letter, speed } => {
                    // Letters outside the alphabet are unknown shapes; skip.
                    let Some(pitch) = self.tuning.letter_pitch(letter) else {
                        continue;
                    };
                    effects.push(Effect::Note {
                        pitch,
                        duration_s: self.tuning.note_duration_s,
                        loudness_db: self.tuning.letter_curve.loudness_db(speed),
                    });
                    if !self.hits.contains_key(&letter) {
                        self.hits.insert(letter, now_ms + self.tuning.hit_expiry_ms);
                        new_letter_hit = true;
                    }
                    effects.push(Effect::Flash { letter });
                    self.flash_until.insert(letter, now_ms + self.tuning.flash_ms);
                }
                Classified::ParticlePair => {
                    let pitch = self.tuning.particle_notes[self.particle_cursor];
                    self.particle_cursor =
                        (self.particle_cursor + 1) % self.tuning.particle_notes.len();
                    effects.push(Effect::Note {
                        pitch,
                        duration_s: self.tuning.note_duration_s,
                        loudness_db: self.tuning.particle_curve.loudness_db(pair.relative_speed),
                    });
                }
                Classified::Ignore => {}
            }
        }

        if new_letter_hit
            && self.hits.len() == self.tuning.alphabet_len()
            && now_ms - self.last_chord_ms > self.tuning.chord_cooldown_ms
        {
            let chord = self.tuning.chords[self.chord_cursor].clone();
            self.chord_cursor = (self.chord_cursor + 1) % self.tuning.chords.len();
            effects.push(Effect::Chord {
                pitches: chord,
                duration_s: self.tuning.chord_duration_s,
                loudness_db: self.tuning.chord_loudness_db,
            });
            self.hits.clear();
            self.last_chord_ms = now_ms;
            self.glow_until = Some(now_ms + self.tuning.glow_ms);
            effects.push(Effect::GlowOn);
        }

        effects
    }

    /// Drain timed effects: hit expiries (silent), flash restores, glow
    /// revert. Call once per frame with the current clock.
    pub fn advance(&mut self, now_ms: f64) -> Vec<Effect> {
        self.hits.retain(|_, deadline| *deadline > now_ms);

        let mut restored: Vec<char> = self
            .flash_until
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(letter, _)| *letter)
            .collect();
        restored.sort_unstable();
        self.flash_until.retain(|_, deadline| *deadline > now_ms);

        let mut effects: Vec<Effect> = restored
            .into_iter()
            .map(|letter| Effect::Unflash { letter })
            .collect();

        if self.glow_until.is_some_and(|deadline| deadline <= now_ms) {
            self.glow_until = None;
            effects.push(Effect::GlowOff);
        }

        effects
    }

    /// Three-way classification, first match wins. A letter+particle pair
    /// must not also be treated as particle+particle.
    fn classify(pair: &ContactPair) -> Classified {
        match (pair.a, pair.b) {
            (Participant::Letter(letter), Participant::Particle { speed })
            | (Participant::Particle { speed }, Participant::Letter(letter)) => {
                Classified::LetterHit { letter, speed }
            }
            (a, b) if a.is_particle() && b.is_particle() => Classified::ParticlePair,
            _ => Classified::Ignore,
        }
    }
}

enum Classified {
    LetterHit { letter: char, speed: f32 },
    ParticlePair,
    Ignore,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn active_engine() -> RewardEngine {
        let mut engine = RewardEngine::new(Tuning::default());
        assert!(engine.request_activation());
        engine.activation_result(true);
        engine
    }

    fn letter_hit(letter: char, speed: f32) -> ContactPair {
        ContactPair {
            a: Participant::Letter(letter),
            b: Participant::Particle { speed },
            relative_speed: speed,
        }
    }

    fn particle_pair(relative_speed: f32) -> ContactPair {
        ContactPair {
            a: Participant::Particle { speed: relative_speed },
            b: Participant::Particle { speed: 0.0 },
            relative_speed,
        }
    }

    fn notes(effects: &[Effect]) -> Vec<Pitch> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Note { pitch, .. } => Some(*pitch),
                _ => None,
            })
            .collect()
    }

    fn chords(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Chord { .. }))
            .count()
    }

    #[test]
    fn test_inactive_audio_is_a_full_noop() {
        let mut engine = RewardEngine::new(Tuning::default());
        let effects = engine.on_collision_batch(0.0, &[letter_hit('I', 10.0)], true);
        assert!(effects.is_empty());
        assert_eq!(engine.armed_count(), 0);
    }

    #[test]
    fn test_suspended_output_freezes_cursors() {
        let mut engine = active_engine();
        let sequence = engine.tuning().particle_notes.clone();
        let all: Vec<ContactPair> = ['I', 'W', 'L', 'Y', 'F']
            .into_iter()
            .map(|c| letter_hit(c, 5.0))
            .collect();

        // Context suspended again after activation: whole batches drop
        assert!(engine.on_collision_batch(0.0, &[particle_pair(3.0)], false).is_empty());
        assert!(engine.on_collision_batch(10.0, &all, false).is_empty());
        assert_eq!(engine.armed_count(), 0);

        // Nothing was consumed while silent: the particle sequence still
        // starts at its first entry and the first chord still fires
        let effects = engine.on_collision_batch(20.0, &[particle_pair(3.0)], true);
        assert_eq!(notes(&effects), vec![sequence[0]]);
        let effects = engine.on_collision_batch(30.0, &all, true);
        assert_eq!(chords(&effects), 1);
    }

    #[test]
    fn test_all_letters_complete_a_chord() {
        let mut engine = active_engine();
        let first_chord = engine.tuning().chords[0].clone();

        // Hit I, W, L, Y within 1s - four notes, no chord yet
        for (i, letter) in ['I', 'W', 'L', 'Y'].into_iter().enumerate() {
            let effects = engine.on_collision_batch(i as f64 * 200.0, &[letter_hit(letter, 5.0)], true);
            assert_eq!(notes(&effects).len(), 1);
            assert_eq!(chords(&effects), 0);
        }

        // Fifth letter completes the set
        let effects = engine.on_collision_batch(900.0, &[letter_hit('F', 5.0)], true);
        assert_eq!(notes(&effects).len(), 1);
        assert_eq!(chords(&effects), 1);
        assert!(effects.contains(&Effect::GlowOn));
        match effects.iter().find(|e| matches!(e, Effect::Chord { .. })) {
            Some(Effect::Chord { pitches, .. }) => assert_eq!(*pitches, first_chord),
            _ => unreachable!(),
        }
        // Set cleared by completion
        assert_eq!(engine.armed_count(), 0);
    }

    #[test]
    fn test_four_letters_is_not_enough() {
        let mut engine = active_engine();
        for letter in ['I', 'W', 'L', 'Y'] {
            let effects = engine.on_collision_batch(100.0, &[letter_hit(letter, 5.0)], true);
            assert_eq!(chords(&effects), 0);
        }
        // Re-hitting an armed letter doesn't help
        let effects = engine.on_collision_batch(200.0, &[letter_hit('I', 5.0)], true);
        assert_eq!(chords(&effects), 0);
        assert_eq!(engine.armed_count(), 4);
    }

    #[test]
    fn test_expired_hit_blocks_completion() {
        let mut engine = active_engine();
        let expiry = engine.tuning().hit_expiry_ms;

        for letter in ['I', 'W', 'L', 'Y'] {
            engine.on_collision_batch(0.0, &[letter_hit(letter, 5.0)], true);
        }
        // The fifth hit lands after the first four lapsed
        let effects = engine.on_collision_batch(expiry + 100.0, &[letter_hit('F', 5.0)], true);
        assert_eq!(chords(&effects), 0);
        assert_eq!(engine.armed_count(), 1);
    }

    #[test]
    fn test_chord_cooldown_suppresses_retrigger() {
        let mut engine = active_engine();
        let cooldown = engine.tuning().chord_cooldown_ms;
        let all: Vec<ContactPair> = ['I', 'W', 'L', 'Y', 'F']
            .into_iter()
            .map(|c| letter_hit(c, 5.0))
            .collect();

        let effects = engine.on_collision_batch(1000.0, &all, true);
        assert_eq!(chords(&effects), 1);

        // Full set again inside the cooldown window: suppressed, and the
        // set stays armed
        let suppressed_at = 1000.0 + cooldown - 1.0;
        let effects = engine.on_collision_batch(suppressed_at, &all, true);
        assert_eq!(chords(&effects), 0);
        assert_eq!(engine.armed_count(), 5);

        // Once those entries lapse, a fresh completion outside the window
        // fires the second progression entry
        let second_chord = engine.tuning().chords[1].clone();
        let retry_at = suppressed_at + engine.tuning().hit_expiry_ms + 100.0;
        let effects = engine.on_collision_batch(retry_at, &all, true);
        assert_eq!(chords(&effects), 1);
        match effects.iter().find(|e| matches!(e, Effect::Chord { .. })) {
            Some(Effect::Chord { pitches, .. }) => assert_eq!(*pitches, second_chord),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_particle_cursor_advances_and_wraps() {
        let mut engine = active_engine();
        let sequence = engine.tuning().particle_notes.clone();

        let mut played = Vec::new();
        for i in 0..sequence.len() + 1 {
            let effects = engine.on_collision_batch(i as f64, &[particle_pair(3.0)], true);
            played.extend(notes(&effects));
        }
        assert_eq!(played.len(), sequence.len() + 1);
        assert_eq!(&played[..sequence.len()], &sequence[..]);
        // Wrapped back to the first entry
        assert_eq!(played[sequence.len()], sequence[0]);
    }

    #[test]
    fn test_zero_speed_lands_on_curve_floor() {
        let mut engine = active_engine();
        let floor = engine.tuning().particle_curve.offset_db;
        let effects = engine.on_collision_batch(0.0, &[particle_pair(0.0)], true);
        match &effects[0] {
            Effect::Note { loudness_db, .. } => {
                assert!(loudness_db.is_finite());
                assert_eq!(*loudness_db, floor);
            }
            other => panic!("expected a note, got {other:?}"),
        }
    }

    #[test]
    fn test_wall_and_unknown_pairs_are_ignored() {
        let mut engine = active_engine();
        let pairs = [
            ContactPair {
                a: Participant::Particle { speed: 10.0 },
                b: Participant::Wall,
                relative_speed: 10.0,
            },
            ContactPair {
                a: Participant::Wall,
                b: Participant::Wall,
                relative_speed: 0.0,
            },
            // A letter that was never configured
            letter_hit('Q', 10.0),
        ];
        let effects = engine.on_collision_batch(0.0, &pairs, true);
        assert!(effects.is_empty());
        assert_eq!(engine.armed_count(), 0);
    }

    #[test]
    fn test_rehit_reschedules_flash_restore() {
        let mut engine = active_engine();
        let flash = engine.tuning().flash_ms;

        engine.on_collision_batch(0.0, &[letter_hit('I', 5.0)], true);
        // Second hit before the first restore would have fired
        engine.on_collision_batch(flash - 20.0, &[letter_hit('I', 5.0)], true);

        // The original deadline passes without a restore
        assert!(engine.advance(flash + 1.0).is_empty());

        // The rescheduled deadline fires exactly once
        let effects = engine.advance(flash - 20.0 + flash + 1.0);
        assert_eq!(effects, vec![Effect::Unflash { letter: 'I' }]);
        assert!(engine.advance(flash * 3.0).is_empty());
    }

    #[test]
    fn test_glow_reverts_after_delay() {
        let mut engine = active_engine();
        let glow = engine.tuning().glow_ms;
        let all: Vec<ContactPair> = ['I', 'W', 'L', 'Y', 'F']
            .into_iter()
            .map(|c| letter_hit(c, 5.0))
            .collect();

        engine.on_collision_batch(0.0, &all, true);
        assert!(!engine.advance(glow - 1.0).contains(&Effect::GlowOff));
        assert!(engine.advance(glow + 1.0).contains(&Effect::GlowOff));
    }

    proptest! {
        #[test]
        fn prop_letter_loudness_monotonic_and_clamped(
            s1 in 0.0f32..10_000.0,
            delta in 0.0f32..10_000.0,
        ) {
            let curve = Tuning::default().letter_curve;
            let a = curve.loudness_db(s1);
            let b = curve.loudness_db(s1 + delta);
            prop_assert!(a.is_finite());
            prop_assert!(b + 1e-4 >= a, "loudness must be non-decreasing in speed");
            prop_assert!(b <= curve.ceiling_db);
        }
    }
}
