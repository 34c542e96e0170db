//! Audio voices using the Web Audio API
//!
//! Two procedurally synthesized voices, no sample files: a "main" voice
//! (triangle oscillators, short envelope) for single notes and a "chord"
//! voice (sawtooth, slow envelope) for progression chords. Every trigger is
//! fire-and-forget; a failed JS call drops the sound and nothing else.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use crate::music::Pitch;

/// Convert decibels to a linear gain factor.
fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Audio output for the toy.
pub struct AudioPlayer {
    ctx: Option<AudioContext>,
    master_volume: f32,
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer {
    pub fn new() -> Self {
        // Context creation can fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 1.0,
        }
    }

    /// Ask the context to resume (required after a user gesture). Returns
    /// the resume promise so the caller can observe success/failure.
    pub fn resume(&self) -> Option<js_sys::Promise> {
        self.ctx.as_ref().and_then(|ctx| ctx.resume().ok())
    }

    /// Set master volume (0.0 - 1.0), scaling every subsequent trigger.
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Whether the output context is currently running.
    pub fn is_running(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|ctx| ctx.state() == AudioContextState::Running)
    }

    /// Trigger a single pitch on the main voice.
    pub fn trigger_note(&self, pitch: Pitch, duration_s: f32, loudness_db: f32) {
        let Some(ctx) = &self.ctx else { return };
        let peak = db_to_gain(loudness_db) * self.master_volume;
        let Some((osc, gain)) = self.create_osc(ctx, pitch.frequency_hz(), OscillatorType::Triangle)
        else {
            return;
        };
        let t = ctx.current_time();
        let dur = duration_s as f64;

        // Short pluck: 10ms attack, decay to a 20% sustain, 0.5s release
        gain.gain().set_value_at_time(0.0001, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(peak, t + 0.01)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time((peak * 0.2).max(0.0001), t + 0.21)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + dur + 0.5)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + dur + 0.55).ok();
    }

    /// Trigger all pitches of a chord as one simultaneous onset on the
    /// chord voice.
    pub fn trigger_chord(&self, pitches: &[Pitch], duration_s: f32, loudness_db: f32) {
        let Some(ctx) = &self.ctx else { return };
        let peak = db_to_gain(loudness_db) * self.master_volume;
        let t = ctx.current_time();
        let dur = duration_s as f64;

        for pitch in pitches {
            let Some((osc, gain)) =
                self.create_osc(ctx, pitch.frequency_hz(), OscillatorType::Sawtooth)
            else {
                continue;
            };

            // Slower swell: 50ms attack, decay to 80% sustain, 1s release
            gain.gain().set_value_at_time(0.0001, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(peak, t + 0.05)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time((peak * 0.8).max(0.0001), t + 0.35)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.0001, t + dur + 1.0)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + dur + 1.1).ok();
        }
    }

    /// Create an oscillator routed through its own gain node.
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }
}
