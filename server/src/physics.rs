//! Minimal rigid-body facade standing in for the out-of-scope physics
//! engine.
//!
//! Dynamic bodies are spheres under gravity with a ground plane at z = 0;
//! kinematic bodies are driven by their entity and only store a pose;
//! fixed bodies are recorded from scene metadata. Just enough simulation
//! exists for the world's ordering contract (physics step before entity
//! reads) to be real.

use penalty_shared::vec3::{add, scale, Vec3};
use std::collections::HashMap;

/// Scene gravity, z-up.
pub const GRAVITY: Vec3 = Vec3 {
    x: 0.0,
    y: 0.0,
    z: -9.81,
};

/// Identity quaternion (x, y, z, w).
pub const IDENTITY_ROTATION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Integrated by the facade; pose is read back by its entity.
    Dynamic,
    /// Pose is pushed in by its entity every frame.
    Kinematic,
    /// Static collider recorded from the scene.
    Fixed,
}

#[derive(Debug, Clone)]
pub struct RigidBody {
    pub kind: BodyKind,
    pub translation: Vec3,
    pub rotation: [f64; 4],
    pub velocity: Vec3,
    pub mass: f64,
    /// Sphere radius for dynamic bodies, otherwise unused.
    pub radius: f64,
}

pub struct PhysicsWorld {
    gravity: Vec3,
    bodies: HashMap<u32, RigidBody>,
    next_handle: u32,
    /// Velocity kept after a ground bounce (ball bounciness).
    pub restitution: f64,
    /// Horizontal velocity fraction lost per ground contact.
    pub friction: f64,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            bodies: HashMap::new(),
            next_handle: 1,
            restitution: 0.8,
            friction: 0.6,
        }
    }

    pub fn create_body(
        &mut self,
        kind: BodyKind,
        translation: Vec3,
        rotation: [f64; 4],
        mass: f64,
        radius: f64,
    ) -> BodyHandle {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.bodies.insert(
            handle,
            RigidBody {
                kind,
                translation,
                rotation,
                velocity: Vec3::ZERO,
                mass,
                radius,
            },
        );
        BodyHandle(handle)
    }

    pub fn remove_body(&mut self, handle: BodyHandle) {
        if self.bodies.remove(&handle.0).is_none() {
            tracing::warn!(handle = handle.0, "removing unknown physics body");
        }
    }

    pub fn translation(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&handle.0).map(|b| b.translation)
    }

    pub fn rotation(&self, handle: BodyHandle) -> Option<[f64; 4]> {
        self.bodies.get(&handle.0).map(|b| b.rotation)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&handle.0).map(|b| b.velocity)
    }

    pub fn set_translation(&mut self, handle: BodyHandle, translation: Vec3) {
        match self.bodies.get_mut(&handle.0) {
            Some(body) => body.translation = translation,
            None => tracing::warn!(handle = handle.0, "set_translation on unknown body"),
        }
    }

    pub fn set_rotation(&mut self, handle: BodyHandle, rotation: [f64; 4]) {
        match self.bodies.get_mut(&handle.0) {
            Some(body) => body.rotation = rotation,
            None => tracing::warn!(handle = handle.0, "set_rotation on unknown body"),
        }
    }

    /// Apply an impulse to a dynamic body (velocity += impulse / mass).
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        match self.bodies.get_mut(&handle.0) {
            Some(body) if body.kind == BodyKind::Dynamic => {
                body.velocity = add(body.velocity, scale(impulse, 1.0 / body.mass));
            }
            Some(_) => {
                tracing::warn!(handle = handle.0, "impulse on non-dynamic body ignored");
            }
            None => tracing::warn!(handle = handle.0, "impulse on unknown body"),
        }
    }

    /// Advance every dynamic body by one step.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let gravity = self.gravity;
        let restitution = self.restitution;
        let friction = self.friction;

        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            body.velocity = add(body.velocity, scale(gravity, dt));
            body.translation = add(body.translation, scale(body.velocity, dt));

            // Ground plane contact
            if body.translation.z < body.radius && body.velocity.z < 0.0 {
                body.translation.z = body.radius;
                body.velocity.z = -body.velocity.z * restitution;
                body.velocity.x *= 1.0 - friction * dt;
                body.velocity.y *= 1.0 - friction * dt;
                // Kill micro-bounces so resting balls settle
                if body.velocity.z.abs() < 0.05 {
                    body.velocity.z = 0.0;
                }
            }
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
