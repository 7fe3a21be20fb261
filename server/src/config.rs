use crate::error::WorldError;
use std::time::Duration;

/// Timing and force constants of the penalty state machine.
///
/// Kept in the config so tests can shrink the wall-clock delays; the
/// defaults are the gameplay values.
#[derive(Debug, Clone)]
pub struct PenaltyTiming {
    /// Delay between the scenario becoming ready and the penalty executing.
    pub pre_shot_delay: Duration,
    /// How long before the shooter animation's nominal end the ball
    /// impulse is applied.
    pub impulse_lead: Duration,
    /// Base impulse magnitude in the horizontal plane.
    pub base_force: f64,
    /// Impulse magnitude applied to the vertical component.
    pub lift_force: f64,
}

impl Default for PenaltyTiming {
    fn default() -> Self {
        Self {
            pre_shot_delay: Duration::from_millis(1000),
            impulse_lead: Duration::from_millis(950),
            base_force: 0.2,
            lift_force: 0.1,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_rate_hz: u32,
    pub broadcast_rate_hz: u32,
    /// Path of the JSON scene asset describing the pitch, spawn points
    /// and scenarios.
    pub scene_path: String,
    pub rng_seed: u64,
    pub timing: PenaltyTiming,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9001".to_string(),
            tick_rate_hz: 60,
            broadcast_rate_hz: 15,
            scene_path: "assets/penalty.scene.json".to_string(),
            rng_seed: 42,
            timing: PenaltyTiming::default(),
        }
    }
}

impl ServerConfig {
    /// Validate invariants the game loop relies on.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.tick_rate_hz == 0 {
            return Err(WorldError::InvalidConfig("tick_rate_hz must be > 0".into()));
        }
        if self.broadcast_rate_hz == 0 {
            return Err(WorldError::InvalidConfig(
                "broadcast_rate_hz must be > 0".into(),
            ));
        }
        if self.broadcast_rate_hz > self.tick_rate_hz {
            return Err(WorldError::InvalidConfig(
                "broadcast_rate_hz must not exceed tick_rate_hz".into(),
            ));
        }
        if self.tick_rate_hz % self.broadcast_rate_hz != 0 {
            return Err(WorldError::InvalidConfig(
                "tick_rate_hz must be a multiple of broadcast_rate_hz".into(),
            ));
        }
        if self.scene_path.is_empty() {
            return Err(WorldError::InvalidConfig("scene_path must be set".into()));
        }
        Ok(())
    }
}
