//! Entity capability traits.
//!
//! Entities are plain structs holding handles into the physics facade
//! rather than extending any engine type; the world owns them as trait
//! objects and drives them through [`Updatable`].

use crate::physics::{BodyHandle, PhysicsWorld};
use penalty_shared::game::EntityKind;
use penalty_shared::vec3::Vec3;

/// Stable identity of a spawned entity within one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Anything invoked once per frame with elapsed time, in priority order
/// (lower `update_order` runs first).
pub trait Updatable {
    fn update_order(&self) -> i32;

    /// One frame. Exactly one direction of pose sync happens here:
    /// physics-driven entities pull their pose from the body,
    /// kinematically-driven entities push theirs into it.
    fn update(&mut self, physics: Option<&mut PhysicsWorld>, time_step: f64, unscaled_time_step: f64);
}

/// A world-resident entity: an updatable with identity, kind and pose.
pub trait Entity: Updatable + Send {
    fn id(&self) -> EntityId;

    fn kind(&self) -> EntityKind;

    fn translation(&self) -> Vec3;

    fn rotation(&self) -> [f64; 4];

    /// Physics body backing this entity, if any.
    fn body(&self) -> Option<BodyHandle> {
        None
    }

    /// Name of the animation clip currently playing, if any.
    fn active_clip(&self) -> Option<&str> {
        None
    }

    /// Start an animation clip; returns the playable duration. Entities
    /// without animation state ignore the request.
    fn set_animation(
        &mut self,
        _name: &str,
        _fade_in: f64,
        _weight: f64,
        _looping: bool,
        _clamp_when_finished: bool,
    ) -> Option<f64> {
        None
    }

    /// Release physics resources when the entity leaves the world.
    fn despawn(&mut self, _physics: Option<&mut PhysicsWorld>) {}
}
