use penalty_shared::game::EntityKind;
use std::fmt;

/// Errors surfaced by the world and scenario machinery.
///
/// Loading failures are recovered with a placeholder scene; role and
/// precondition failures are logged and degrade to "nothing happens",
/// never a crash of the loop.
#[derive(Debug)]
pub enum WorldError {
    /// A physics-dependent or scene-dependent operation ran before the
    /// asynchronous initialization completed.
    NotReady { what: &'static str, op: &'static str },
    /// A required model was absent from the loaded scene.
    MissingModel { model: &'static str },
    /// A scenario could not resolve exactly one entity for a role.
    MissingRole {
        scenario: String,
        kind: EntityKind,
        found: usize,
    },
    /// `launch_scenario` was called with an id no scenario carries.
    UnknownScenario { id: String },
    /// The scene asset could not be read or parsed.
    SceneLoad { path: String, reason: String },
    /// A referenced entity is not present in the world.
    NoSuchEntity { id: u32 },
    /// Server configuration failed validation.
    InvalidConfig(String),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::NotReady { what, op } => {
                write!(f, "{} is not initialized yet (while trying to {})", what, op)
            }
            WorldError::MissingModel { model } => {
                write!(f, "scene has no \"{}\" model", model)
            }
            WorldError::MissingRole {
                scenario,
                kind,
                found,
            } => write!(
                f,
                "scenario \"{}\" needs exactly one {:?}, found {}",
                scenario, kind, found
            ),
            WorldError::UnknownScenario { id } => write!(f, "no scenario with id \"{}\"", id),
            WorldError::SceneLoad { path, reason } => {
                write!(f, "failed to load scene \"{}\": {}", path, reason)
            }
            WorldError::NoSuchEntity { id } => write!(f, "no entity with id {}", id),
            WorldError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for WorldError {}

pub type Result<T> = std::result::Result<T, WorldError>;
