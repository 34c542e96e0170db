//! Physics world wrapper
//!
//! Owns the rapier2d simulation: boundary walls, static letter cuboids, and
//! dynamic tap-spawned particles. Each step drains rapier's collision events
//! into role-tagged [`ContactPair`]s for the reward engine; nothing outside
//! this module touches physics types.

use std::collections::HashMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rapier2d::crossbeam::channel::{Receiver, unbounded};
use rapier2d::prelude::*;

use crate::consts::*;
use crate::engine::{ContactPair, Participant};
use crate::layout::LetterPlacement;

/// What a collider handle stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Role {
    Letter(char),
    Particle,
    Wall,
}

/// Bookkeeping for one spawned particle.
#[derive(Debug, Clone, Copy)]
struct ParticleBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    radius: f32,
    hue_deg: f32,
    spawned_ms: f64,
}

/// Render-facing snapshot of a particle.
#[derive(Debug, Clone, Copy)]
pub struct ParticleView {
    pub pos: Vec2,
    pub radius: f32,
    pub hue_deg: f32,
}

pub struct World {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    event_handler: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    _contact_force_recv: Receiver<ContactForceEvent>,

    roles: HashMap<ColliderHandle, Role>,
    particles: Vec<ParticleBody>,
    rng: Pcg32,
}

impl World {
    /// Build a world for a `view_w` x `view_h` viewport with the given
    /// letter placements already computed.
    pub fn new(view_w: f32, view_h: f32, placements: &[LetterPlacement], seed: u64) -> Self {
        let (collision_send, collision_recv) = unbounded();
        let (contact_force_send, contact_force_recv) = unbounded();

        let mut world = Self {
            gravity: vector![0.0, GRAVITY_PX_S2],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            event_handler: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_recv,
            _contact_force_recv: contact_force_recv,
            roles: HashMap::new(),
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        };

        world.add_walls(view_w, view_h);
        for p in placements {
            world.add_letter(p);
        }
        world
    }

    fn add_walls(&mut self, w: f32, h: f32) {
        let t = WALL_THICKNESS;
        // Centers sit just outside the viewport; extents overlap the corners
        let walls = [
            (w / 2.0, -t / 2.0 + 1.0, w / 2.0 + t, t / 2.0),
            (w / 2.0, h + t / 2.0 - 1.0, w / 2.0 + t, t / 2.0),
            (-t / 2.0 + 1.0, h / 2.0, t / 2.0, h / 2.0 + t),
            (w + t / 2.0 - 1.0, h / 2.0, t / 2.0, h / 2.0 + t),
        ];
        for (cx, cy, hx, hy) in walls {
            let body = RigidBodyBuilder::fixed().translation(vector![cx, cy]).build();
            let handle = self.bodies.insert(body);
            let collider = ColliderBuilder::cuboid(hx, hy).restitution(WALL_RESTITUTION).build();
            let ch = self
                .colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
            self.roles.insert(ch, Role::Wall);
        }
    }

    fn add_letter(&mut self, placement: &LetterPlacement) {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![placement.center.x, placement.center.y])
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(placement.half_extents.x, placement.half_extents.y)
            .friction(LETTER_FRICTION)
            .restitution(LETTER_RESTITUTION)
            .build();
        let ch = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.roles.insert(ch, Role::Letter(placement.letter));
    }

    /// Spawn a particle at world coordinates, with randomized radius, hue
    /// and a small velocity jitter.
    pub fn spawn_particle(&mut self, x: f32, y: f32, now_ms: f64) {
        let radius = self.rng.random_range(PARTICLE_RADIUS_MIN..=PARTICLE_RADIUS_MAX);
        let hue_deg = self.rng.random_range(0.0..360.0);
        let jitter = self.rng.random_range(-30.0..30.0);

        let body = RigidBodyBuilder::dynamic()
            .translation(vector![x, y])
            .linvel(vector![jitter, 0.0])
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .restitution(PARTICLE_RESTITUTION)
            .friction(PARTICLE_FRICTION)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let ch = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.roles.insert(ch, Role::Particle);
        self.particles.push(ParticleBody {
            body: handle,
            collider: ch,
            radius,
            hue_deg,
            spawned_ms: now_ms,
        });
    }

    /// Remove every particle. Static bodies and reward state are untouched.
    pub fn clear_particles(&mut self) {
        let drained: Vec<ParticleBody> = self.particles.drain(..).collect();
        for p in drained {
            self.remove_particle_body(&p);
        }
    }

    /// Remove particles older than `lifetime_ms`, if a lifetime is set.
    pub fn expire_particles(&mut self, now_ms: f64, lifetime_ms: Option<f64>) {
        let Some(lifetime) = lifetime_ms else { return };
        let (expired, live): (Vec<ParticleBody>, Vec<ParticleBody>) = self
            .particles
            .drain(..)
            .partition(|p| now_ms - p.spawned_ms >= lifetime);
        self.particles = live;
        for p in expired {
            self.remove_particle_body(&p);
        }
    }

    fn remove_particle_body(&mut self, p: &ParticleBody) {
        self.roles.remove(&p.collider);
        self.bodies.remove(
            p.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Render-facing particle positions.
    pub fn particle_views(&self) -> Vec<ParticleView> {
        self.particles
            .iter()
            .filter_map(|p| {
                let body = self.bodies.get(p.body)?;
                let t = body.translation();
                Some(ParticleView {
                    pos: Vec2::new(t.x, t.y),
                    radius: p.radius,
                    hue_deg: p.hue_deg,
                })
            })
            .collect()
    }

    /// Advance the simulation by `dt` seconds and return the contacts that
    /// began during this step, role-tagged for the reward engine.
    ///
    /// Contact speeds come from a pre-step velocity snapshot: by the time
    /// rapier delivers the event the solver has already applied restitution,
    /// and post-solve velocities would understate the impact.
    pub fn step(&mut self, dt: f32) -> Vec<ContactPair> {
        let before: HashMap<ColliderHandle, Vector<Real>> = self
            .particles
            .iter()
            .filter_map(|p| Some((p.collider, *self.bodies.get(p.body)?.linvel())))
            .collect();

        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.event_handler,
        );

        let mut pairs = Vec::new();
        while let Ok(event) = self.collision_recv.try_recv() {
            let CollisionEvent::Started(h1, h2, _) = event else {
                continue;
            };
            // A handle can be stale if its particle was removed this frame
            let (Some(a), Some(b)) = (self.participant(h1, &before), self.participant(h2, &before))
            else {
                continue;
            };
            pairs.push(ContactPair {
                a,
                b,
                relative_speed: Self::relative_speed(h1, h2, &before),
            });
        }
        pairs
    }

    fn participant(
        &self,
        handle: ColliderHandle,
        before: &HashMap<ColliderHandle, Vector<Real>>,
    ) -> Option<Participant> {
        Some(match self.roles.get(&handle)? {
            Role::Letter(c) => Participant::Letter(*c),
            Role::Wall => Participant::Wall,
            Role::Particle => Participant::Particle {
                speed: Self::snapshot_velocity(handle, before).norm(),
            },
        })
    }

    fn relative_speed(
        h1: ColliderHandle,
        h2: ColliderHandle,
        before: &HashMap<ColliderHandle, Vector<Real>>,
    ) -> f32 {
        let v1 = Self::snapshot_velocity(h1, before);
        let v2 = Self::snapshot_velocity(h2, before);
        (v1 - v2).norm()
    }

    // Walls and letters are fixed bodies and never enter the snapshot
    fn snapshot_velocity(
        handle: ColliderHandle,
        before: &HashMap<ColliderHandle, Vector<Real>>,
    ) -> Vector<Real> {
        before.get(&handle).copied().unwrap_or_else(|| vector![0.0, 0.0])
    }
}
