//! Engine-facing collision and activation types

/// One side of a collision pair, tagged by role.
///
/// The physics layer resolves collider handles into these before the engine
/// sees them; the engine never touches physics types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Participant {
    /// A static letter obstacle, identified by its character.
    Letter(char),
    /// A dynamic particle with its instantaneous speed at impact.
    Particle { speed: f32 },
    /// A boundary wall.
    Wall,
}

impl Participant {
    pub fn is_particle(&self) -> bool {
        matches!(self, Participant::Particle { .. })
    }
}

/// A collision reported by the physics world for one new contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPair {
    pub a: Participant,
    pub b: Participant,
    /// Relative impact speed between the two bodies.
    pub relative_speed: f32,
}

/// Audio activation state machine.
///
/// Browsers only allow audio output after a user gesture, so the first tap
/// requests activation and the engine stays silent until the context is
/// confirmed running. A failed request is retried by the next tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Inactive,
    /// A resume request is in flight.
    Activating,
    Active,
    /// The last request failed; the next interaction retries.
    Failed,
}

impl ActivationState {
    pub fn is_active(self) -> bool {
        self == ActivationState::Active
    }

    /// Record a user interaction. Returns true when the host should issue a
    /// (new) activation request to the audio context; repeated taps while a
    /// request is in flight or after success are no-ops.
    pub fn request(&mut self) -> bool {
        match self {
            ActivationState::Inactive | ActivationState::Failed => {
                *self = ActivationState::Activating;
                true
            }
            ActivationState::Activating | ActivationState::Active => false,
        }
    }

    /// Record the outcome of an in-flight activation request.
    pub fn complete(&mut self, ok: bool) {
        if *self == ActivationState::Activating {
            *self = if ok {
                ActivationState::Active
            } else {
                ActivationState::Failed
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_machine() {
        let mut s = ActivationState::default();
        assert!(!s.is_active());

        // First tap requests, second tap while in flight does not
        assert!(s.request());
        assert!(!s.request());

        // Failure is retryable by the next tap
        s.complete(false);
        assert_eq!(s, ActivationState::Failed);
        assert!(s.request());
        s.complete(true);
        assert!(s.is_active());

        // Further taps are no-ops once active
        assert!(!s.request());
        // Stale completion results don't knock us out of Active
        s.complete(false);
        assert!(s.is_active());
    }
}
