//! Scenario: a named, launchable bundle of spawn points plus the entity
//! registry populated by a launch.

use crate::entity::EntityId;
use crate::scene::SceneNode;
use crate::spawn::SpawnPoint;
use crate::world::World;
use penalty_shared::game::EntityKind;
use penalty_shared::vec3::Vec3;
use std::collections::HashMap;

pub struct Scenario {
    pub id: String,
    pub name: String,
    pub default: bool,
    pub spawn_always: bool,
    pub spawn_points: Vec<SpawnPoint>,
    /// Entities registered by the current run, in spawn order.
    entities: Vec<EntityId>,
    by_kind: HashMap<EntityKind, Vec<EntityId>>,
}

impl Scenario {
    /// Build a scenario from a scene node tagged `data = "scenario"`,
    /// collecting spawn markers from its descendants in document order.
    pub fn from_node(node: &SceneNode, parent_translation: Vec3) -> Self {
        let mut spawn_points = Vec::new();
        node.visit(parent_translation, &mut |child, world_translation| {
            if let Some(sp) = SpawnPoint::from_node(child, world_translation) {
                spawn_points.push(sp);
            }
        });

        Self {
            id: node.name.clone(),
            name: node
                .display_name
                .clone()
                .unwrap_or_else(|| node.name.clone()),
            default: node.default,
            spawn_always: node.spawn_always,
            spawn_points,
            entities: Vec::new(),
            by_kind: HashMap::new(),
        }
    }

    /// An empty scenario, used as the detached stand-in while a real one
    /// is temporarily taken out of the world.
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            default: false,
            spawn_always: false,
            spawn_points: Vec::new(),
            entities: Vec::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Despawn the previous run's entities and run every spawn point,
    /// registering each produced entity. Spawn failures are reported and
    /// skipped; role checks happen in the all-spawned hook of the
    /// concrete scenario.
    pub fn launch(&mut self, world: &mut World) {
        self.clear(world);

        // Collect first: spawn order is document order, and later points
        // may rely on world state touched by earlier ones.
        let spawn_points = self.spawn_points.clone();
        for sp in &spawn_points {
            match sp.spawn(world) {
                Ok(id) => self.register(id, sp.kind),
                Err(e) => {
                    tracing::error!(scenario = %self.id, kind = ?sp.kind, error = %e, "spawn failed");
                }
            }
        }
    }

    fn register(&mut self, id: EntityId, kind: EntityKind) {
        self.entities.push(id);
        self.by_kind.entry(kind).or_default().push(id);
    }

    /// Entities of a given kind spawned by the current run. Never fails;
    /// unknown kinds yield an empty slice.
    pub fn entities_by_kind(&self, kind: EntityKind) -> &[EntityId] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Despawn everything this scenario registered. Relaunch policy:
    /// superseded entities are removed from the world, not left dangling.
    pub fn clear(&mut self, world: &mut World) {
        for id in self.entities.drain(..) {
            world.despawn_entity(id);
        }
        self.by_kind.clear();
    }
}
