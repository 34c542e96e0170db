//! Interaction reward engine
//!
//! Translates collision events into sound-trigger commands and transient
//! visual feedback. This module must stay pure and platform-free:
//! - No Web Audio, DOM, or physics-engine types
//! - Time arrives as millisecond timestamps from the caller
//! - All deferred behavior (hit expiry, flash/glow restore) is held as
//!   deadlines and drained by [`RewardEngine::advance`]

pub mod reward;
pub mod state;

pub use reward::{Effect, RewardEngine};
pub use state::{ActivationState, ContactPair, Participant};
