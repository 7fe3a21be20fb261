//! Spawn points: immutable entity factories built from scene metadata.

use crate::entity::EntityId;
use crate::error::Result;
use crate::scene::SceneNode;
use crate::world::World;
use penalty_shared::game::EntityKind;
use penalty_shared::vec3::Vec3;

/// A fixed transform plus an entity-type binding. Invoked once per
/// scenario launch.
#[derive(Debug, Clone)]
pub struct SpawnPoint {
    pub kind: EntityKind,
    pub position: Vec3,
    pub rotation: [f64; 4],
}

impl SpawnPoint {
    /// Build a spawn point from a scene node tagged `data = "spawn"`,
    /// given the node's accumulated world translation. Returns `None`
    /// for nodes that are not spawn markers or carry an unknown type.
    pub fn from_node(node: &SceneNode, world_translation: Vec3) -> Option<Self> {
        if node.data.as_deref() != Some("spawn") {
            return None;
        }
        let tag = node.node_type.as_deref()?;
        let Some(kind) = EntityKind::from_tag(tag) else {
            tracing::warn!(node = %node.name, tag, "unknown spawn type, ignoring");
            return None;
        };
        Some(Self {
            kind,
            position: world_translation,
            rotation: node.rotation,
        })
    }

    /// Instantiate the bound entity in the world at this transform.
    pub fn spawn(&self, world: &mut World) -> Result<EntityId> {
        match self.kind {
            EntityKind::Ball => world.spawn_ball(self.position, self.rotation),
            kind => world.spawn_character(kind, self.position, self.rotation),
        }
    }
}
