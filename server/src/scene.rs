//! JSON scene asset: node hierarchy with gameplay metadata, the model
//! inventory and the animation clip table.
//!
//! The equivalent of the original GLTF scene scan: nodes tagged
//! `data = spawn|physics|scenario` carry the gameplay markers; geometry
//! and materials stay on the client.

use crate::error::WorldError;
use penalty_shared::vec3::{add, vec3, Vec3};
use serde::{Deserialize, Serialize};

fn identity_rotation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneNode {
    pub name: String,
    pub translation: [f64; 3],
    pub rotation: [f64; 4],
    /// Gameplay marker: "spawn", "physics" or "scenario".
    pub data: Option<String>,
    /// Marker subtype: goalkeeper|shooter|ball for spawns,
    /// box|plane|cylinder|trimesh for physics nodes.
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub default: bool,
    pub spawn_always: bool,
    pub display_name: Option<String>,
    pub visible: bool,
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            translation: [0.0; 3],
            rotation: identity_rotation(),
            data: None,
            node_type: None,
            default: false,
            spawn_always: false,
            display_name: None,
            visible: default_visible(),
            children: Vec::new(),
        }
    }
}

impl SceneNode {
    pub fn local_translation(&self) -> Vec3 {
        vec3(self.translation[0], self.translation[1], self.translation[2])
    }

    /// Visit this node and all descendants in document order, passing the
    /// accumulated world translation.
    pub fn visit(&self, parent_translation: Vec3, f: &mut impl FnMut(&SceneNode, Vec3)) {
        let world = add(parent_translation, self.local_translation());
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationClip {
    pub name: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneAsset {
    pub name: String,
    /// Models present in the asset bundle ("character", "ball").
    pub models: Vec<String>,
    pub animations: Vec<AnimationClip>,
    pub nodes: Vec<SceneNode>,
    /// True for the built-in stand-in used when loading fails.
    #[serde(default)]
    pub placeholder: bool,
}

impl SceneAsset {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.iter().any(|m| m == name)
    }

    pub fn clip_table(&self) -> Vec<(String, f64)> {
        self.animations
            .iter()
            .map(|clip| (clip.name.clone(), clip.duration))
            .collect()
    }

    /// Built-in scene used when the real asset fails to load: one default
    /// penalty scenario over a flat pitch, visibly marked as a stand-in so
    /// the game starts regardless.
    pub fn placeholder() -> Self {
        let spawn = |name: &str, kind: &str, translation: [f64; 3]| SceneNode {
            name: name.to_string(),
            translation,
            data: Some("spawn".to_string()),
            node_type: Some(kind.to_string()),
            ..Default::default()
        };

        let keeper_clips = [
            "left_down_catch",
            "left_center_take",
            "left_top_catch",
            "center_down_take",
            "center_take",
            "center_top_catch",
            "right_down_catch",
            "right_center_take",
            "right_top_catch",
        ];
        let mut animations = vec![
            AnimationClip {
                name: "idle".to_string(),
                duration: 2.4,
            },
            AnimationClip {
                name: "penalty".to_string(),
                duration: 2.5,
            },
        ];
        animations.extend(keeper_clips.iter().map(|name| AnimationClip {
            name: (*name).to_string(),
            duration: 1.5,
        }));

        Self {
            name: "placeholder_pitch".to_string(),
            models: vec!["character".to_string(), "ball".to_string()],
            animations,
            nodes: vec![
                SceneNode {
                    name: "pitch".to_string(),
                    data: Some("physics".to_string()),
                    node_type: Some("plane".to_string()),
                    ..Default::default()
                },
                SceneNode {
                    name: "penalty_placeholder".to_string(),
                    data: Some("scenario".to_string()),
                    default: true,
                    display_name: Some("Penalty (placeholder)".to_string()),
                    children: vec![
                        spawn("goalkeeper_spawn", "goalkeeper", [0.0, -2.8, 0.0]),
                        spawn("shooter_spawn", "shooter", [0.3, 1.0, 0.0]),
                        spawn("ball_spawn", "ball", [0.0, 0.0, 0.11]),
                    ],
                    ..Default::default()
                },
            ],
            placeholder: true,
        }
    }
}

/// Load and parse a scene asset from disk.
pub async fn load_scene(path: &str) -> Result<SceneAsset, WorldError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| WorldError::SceneLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    SceneAsset::from_json(&json).map_err(|e| WorldError::SceneLoad {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
