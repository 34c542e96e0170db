//! Chimefall - a musical physics toy
//!
//! Taps spawn bouncing particles into a world of five static letter
//! obstacles. Impacts play notes; striking every letter within a time window
//! plays the next chord of a progression.
//!
//! Core modules:
//! - `engine`: pure collision-to-sound reward engine (no platform deps)
//! - `world`: rapier2d physics wrapper, collision events -> tagged pairs
//! - `layout`: one-time letter obstacle placement
//! - `music` / `config`: pitch tables and startup tuning
//! - `audio`: Web Audio voices (wasm)
//! - `render`: Canvas2D presentation (wasm)

pub mod config;
pub mod engine;
pub mod layout;
pub mod music;
pub mod world;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod render;

pub use config::Tuning;
pub use engine::RewardEngine;

/// World constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the frame scheduler)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Downward gravity, pixels/s². Kept low for a floaty feel.
    pub const GRAVITY_PX_S2: f32 = 350.0;

    /// Boundary wall thickness (walls sit just outside the viewport)
    pub const WALL_THICKNESS: f32 = 60.0;
    pub const WALL_RESTITUTION: f32 = 0.5;

    /// Particle spawn radius range
    pub const PARTICLE_RADIUS_MIN: f32 = 6.0;
    pub const PARTICLE_RADIUS_MAX: f32 = 13.0;
    pub const PARTICLE_RESTITUTION: f32 = 0.85;
    pub const PARTICLE_FRICTION: f32 = 0.05;

    /// Letter obstacle surface properties
    pub const LETTER_FRICTION: f32 = 0.3;
    pub const LETTER_RESTITUTION: f32 = 0.5;

    /// Highlight color a letter flashes to when struck
    pub const FLASH_COLOR: &str = "#ffffff";
}
