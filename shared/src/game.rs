//! Core gameplay enums shared with the client: entity kinds, goal zones
//! and the penalty outcome.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Closed set of entity kinds the world can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Goalkeeper,
    Shooter,
    Ball,
}

impl EntityKind {
    /// Parse a scene metadata tag (`type = goalkeeper|shooter|ball`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "goalkeeper" => Some(EntityKind::Goalkeeper),
            "shooter" => Some(EntityKind::Shooter),
            "ball" => Some(EntityKind::Ball),
            _ => None,
        }
    }
}

/// One of nine discrete goal-mouth positions (3 horizontal x 3 vertical),
/// used both for shot targeting and for the keeper's dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum GoalZone {
    LeftDown,
    LeftCenter,
    LeftUp,
    CenterDown,
    CenterCenter,
    CenterUp,
    RightDown,
    RightCenter,
    RightUp,
}

impl GoalZone {
    /// All zones in a fixed order, so a uniform draw can be index-based.
    pub const ALL: [GoalZone; 9] = [
        GoalZone::LeftDown,
        GoalZone::LeftCenter,
        GoalZone::LeftUp,
        GoalZone::CenterDown,
        GoalZone::CenterCenter,
        GoalZone::CenterUp,
        GoalZone::RightDown,
        GoalZone::RightCenter,
        GoalZone::RightUp,
    ];
}

/// Outcome of one penalty: the keeper saves iff both picked the same zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum PenaltyResult {
    Goal,
    Save,
}
