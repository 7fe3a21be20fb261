//! The ball entity.
//!
//! Physics-driven: each frame it pulls its pose from the dynamic body.
//! The penalty scenario applies the shot impulse through it.

use crate::entity::{Entity, EntityId, Updatable};
use crate::physics::{BodyHandle, BodyKind, PhysicsWorld};
use penalty_shared::game::EntityKind;
use penalty_shared::vec3::Vec3;

/// The ball ticks after the characters.
pub const BALL_UPDATE_ORDER: i32 = 4;

const BALL_MASS: f64 = 0.5;
const BALL_RADIUS: f64 = 0.11;

pub struct Ball {
    id: EntityId,
    translation: Vec3,
    rotation: [f64; 4],
    body: BodyHandle,
}

impl Ball {
    pub fn new(
        id: EntityId,
        physics: &mut PhysicsWorld,
        translation: Vec3,
        rotation: [f64; 4],
    ) -> Self {
        let body = physics.create_body(BodyKind::Dynamic, translation, rotation, BALL_MASS, BALL_RADIUS);
        Self {
            id,
            translation,
            rotation,
            body,
        }
    }

    pub fn apply_impulse(&self, physics: &mut PhysicsWorld, impulse: Vec3) {
        physics.apply_impulse(self.body, impulse);
    }
}

impl Updatable for Ball {
    fn update_order(&self) -> i32 {
        BALL_UPDATE_ORDER
    }

    fn update(
        &mut self,
        physics: Option<&mut PhysicsWorld>,
        _time_step: f64,
        _unscaled_time_step: f64,
    ) {
        // Physics sync: body pose drives the visual transform
        let Some(physics) = physics else {
            return;
        };
        if let Some(translation) = physics.translation(self.body) {
            self.translation = translation;
        }
        if let Some(rotation) = physics.rotation(self.body) {
            self.rotation = rotation;
        }
    }
}

impl Entity for Ball {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Ball
    }

    fn translation(&self) -> Vec3 {
        self.translation
    }

    fn rotation(&self) -> [f64; 4] {
        self.rotation
    }

    fn body(&self) -> Option<BodyHandle> {
        Some(self.body)
    }

    fn despawn(&mut self, physics: Option<&mut PhysicsWorld>) {
        if let Some(physics) = physics {
            physics.remove_body(self.body);
        }
    }
}
