//! Goalkeeper and shooter entities.
//!
//! Characters are animation-driven: each frame advances the clip time
//! base and pushes the kinematic pose into the physics facade (never the
//! other way around).

use crate::animation::AnimationSet;
use crate::entity::{Entity, EntityId, Updatable};
use crate::physics::{BodyHandle, BodyKind, PhysicsWorld};
use penalty_shared::game::EntityKind;
use penalty_shared::vec3::Vec3;

/// Characters tick before the ball so keeper/shooter state is settled
/// when the ball reads its pose.
pub const CHARACTER_UPDATE_ORDER: i32 = 1;

const CHARACTER_MASS: f64 = 80.0;
const CHARACTER_RADIUS: f64 = 0.5;

pub struct Character {
    id: EntityId,
    kind: EntityKind,
    translation: Vec3,
    rotation: [f64; 4],
    pub animations: AnimationSet,
    body: Option<BodyHandle>,
}

impl Character {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        translation: Vec3,
        rotation: [f64; 4],
        clips: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            id,
            kind,
            translation,
            rotation,
            animations: AnimationSet::new(clips),
            body: None,
        }
    }

    /// Create the kinematic body mirroring this character's pose.
    pub fn attach_body(&mut self, physics: &mut PhysicsWorld) {
        if self.body.is_some() {
            tracing::warn!(entity = self.id.0, "character already has a body");
            return;
        }
        self.body = Some(physics.create_body(
            BodyKind::Kinematic,
            self.translation,
            self.rotation,
            CHARACTER_MASS,
            CHARACTER_RADIUS,
        ));
    }

    pub fn set_position(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    pub fn set_orientation(&mut self, rotation: [f64; 4]) {
        self.rotation = rotation;
    }
}

impl Updatable for Character {
    fn update_order(&self) -> i32 {
        CHARACTER_UPDATE_ORDER
    }

    fn update(
        &mut self,
        physics: Option<&mut PhysicsWorld>,
        time_step: f64,
        _unscaled_time_step: f64,
    ) {
        self.animations.advance(time_step);

        // Kinematic sync: visual pose drives the body
        if let (Some(physics), Some(body)) = (physics, self.body) {
            physics.set_translation(body, self.translation);
            physics.set_rotation(body, self.rotation);
        }
    }
}

impl Entity for Character {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn translation(&self) -> Vec3 {
        self.translation
    }

    fn rotation(&self) -> [f64; 4] {
        self.rotation
    }

    fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    fn active_clip(&self) -> Option<&str> {
        self.animations.active().map(|clip| clip.name.as_str())
    }

    fn set_animation(
        &mut self,
        name: &str,
        fade_in: f64,
        weight: f64,
        looping: bool,
        clamp_when_finished: bool,
    ) -> Option<f64> {
        self.animations
            .set_animation(name, fade_in, weight, looping, clamp_when_finished)
    }

    fn despawn(&mut self, physics: Option<&mut PhysicsWorld>) {
        if let (Some(physics), Some(body)) = (physics, self.body.take()) {
            physics.remove_body(body);
        }
    }
}
