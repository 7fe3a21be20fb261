use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::game::{EntityKind, GoalZone, PenaltyResult};
use crate::vec3::Vec3;

/// Protocol version - increment when making breaking changes.
/// Client should check this and show error if incompatible.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "entity_state")]
    EntityState(EntityStateMsg),
    #[serde(rename = "scenario_state")]
    ScenarioState(ScenarioStateMsg),
    #[serde(rename = "penalty_result")]
    PenaltyResult(PenaltyResultMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub self_id: u32,
    pub scenarios: Vec<ScenarioWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ScenarioWire {
    pub id: String,
    pub name: String,
    pub default: bool,
    #[serde(default)]
    pub spawn_always: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct EntityStateMsg {
    pub entities: Vec<EntityWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct EntityWire {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: [f64; 3],
    pub rot: [f64; 4],
    /// Name of the animation clip currently playing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
}

/// Scenario lifecycle phase as shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhaseWire {
    Idle,
    Spawning,
    Ready,
    ShotInProgress,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStateMsg {
    pub scenario_id: String,
    pub phase: ScenarioPhaseWire,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PenaltyResultMsg {
    pub scenario_id: String,
    pub target_zone: GoalZone,
    pub keeper_zone: GoalZone,
    pub result: PenaltyResult,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "shoot")]
    Shoot,
    #[serde(rename = "restart_scenario")]
    RestartScenario,
    #[serde(rename = "launch_scenario")]
    LaunchScenario { id: String },
}

// === Conversion helpers ===

/// Round to 4 decimal places (sufficient for poses, saves ~50% JSON size)
#[inline]
fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

impl EntityWire {
    pub fn new(id: u32, kind: EntityKind, pos: Vec3, rot: [f64; 4], clip: Option<String>) -> Self {
        Self {
            id,
            kind,
            pos: [round4(pos.x), round4(pos.y), round4(pos.z)],
            rot: [round4(rot[0]), round4(rot[1]), round4(rot[2]), round4(rot[3])],
            clip,
        }
    }
}
