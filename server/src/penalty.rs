//! The penalty-kick scenario: spawn the three roles, then run a one-shot
//! state machine that times the shot and the keeper's dive and decides
//! the outcome by zone comparison.
//!
//! The physical flight of the ball is cosmetic; the result is determined
//! purely by whether the shooter's target zone equals the keeper's dive
//! zone. A new penalty requires relaunching the scenario.

use crate::config::PenaltyTiming;
use crate::entity::EntityId;
use crate::error::WorldError;
use crate::game_loop::GameCommand;
use crate::scenario::Scenario;
use crate::scheduler::{Scheduler, TimerToken};
use crate::world::World;
use penalty_shared::game::{EntityKind, GoalZone, PenaltyResult};
use penalty_shared::vec3::{normalize, sub, vec3, Vec3};
use rand::Rng;

/// Dive animation played by the keeper for each zone.
pub fn keeper_animation(zone: GoalZone) -> &'static str {
    match zone {
        GoalZone::LeftDown => "left_down_catch",
        GoalZone::LeftCenter => "left_center_take",
        GoalZone::LeftUp => "left_top_catch",
        GoalZone::CenterDown => "center_down_take",
        GoalZone::CenterCenter => "center_take",
        GoalZone::CenterUp => "center_top_catch",
        GoalZone::RightDown => "right_down_catch",
        GoalZone::RightCenter => "right_center_take",
        GoalZone::RightUp => "right_top_catch",
    }
}

/// Fixed world position of each goal-mouth zone (x lateral, y toward the
/// goal, z height).
pub fn zone_position(zone: GoalZone) -> Vec3 {
    match zone {
        GoalZone::LeftDown => vec3(0.5, -2.5, 0.3),
        GoalZone::LeftCenter => vec3(0.5, -2.5, 0.5),
        GoalZone::LeftUp => vec3(0.5, -2.5, 0.7),
        GoalZone::CenterDown => vec3(0.0, -2.5, 0.3),
        GoalZone::CenterCenter => vec3(0.0, -2.5, 0.5),
        GoalZone::CenterUp => vec3(0.0, -2.5, 0.7),
        GoalZone::RightDown => vec3(-0.5, -2.5, 0.3),
        GoalZone::RightCenter => vec3(-0.5, -2.5, 0.5),
        GoalZone::RightUp => vec3(-0.5, -2.5, 0.7),
    }
}

/// Uniform draw over the nine zones.
pub fn draw_zone(rng: &mut impl Rng) -> GoalZone {
    GoalZone::ALL[rng.gen_range(0..GoalZone::ALL.len())]
}

/// Zone match means the keeper got there.
pub fn resolve(target: GoalZone, keeper: GoalZone) -> PenaltyResult {
    if target == keeper {
        PenaltyResult::Save
    } else {
        PenaltyResult::Goal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyPhase {
    Idle,
    Spawning,
    Ready,
    ShotInProgress,
    Resolved(PenaltyResult),
}

pub struct PenaltyScenario {
    pub scenario: Scenario,
    pub phase: PenaltyPhase,
    /// Incremented per launch; deferred commands carry it so stale
    /// triggers from a superseded run are dropped.
    pub run: u32,
    goalkeeper: Option<EntityId>,
    shooter: Option<EntityId>,
    ball: Option<EntityId>,
    pending: Vec<TimerToken>,
}

impl PenaltyScenario {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            phase: PenaltyPhase::Idle,
            run: 0,
            goalkeeper: None,
            shooter: None,
            ball: None,
            pending: Vec::new(),
        }
    }

    /// Detached stand-in used while a scenario is temporarily taken out
    /// of the world.
    pub fn detached() -> Self {
        Self::new(Scenario::empty())
    }

    /// Spawn all entities, resolve roles and arm the penalty trigger.
    /// Outstanding timers from the previous run are cancelled first.
    pub fn launch(&mut self, world: &mut World, scheduler: &Scheduler, timing: &PenaltyTiming) {
        self.run = self.run.wrapping_add(1);
        for token in self.pending.drain(..) {
            token.cancel();
        }
        self.goalkeeper = None;
        self.shooter = None;
        self.ball = None;
        self.phase = PenaltyPhase::Spawning;

        self.scenario.launch(world);
        self.on_all_entities_spawned(scheduler, timing);
    }

    /// Runs exactly once per launch, after every spawn point completed.
    fn on_all_entities_spawned(&mut self, scheduler: &Scheduler, timing: &PenaltyTiming) {
        match self.resolve_roles() {
            Ok(()) => {
                self.phase = PenaltyPhase::Ready;
                self.start(scheduler, timing);
            }
            Err(e) => {
                // Stays in Spawning: no silent partial execution
                tracing::error!(scenario = %self.scenario.id, error = %e, "penalty scenario cannot execute");
            }
        }
    }

    /// Bind exactly one entity per role. Empty roles are an error;
    /// duplicates keep the first spawned and are logged.
    fn resolve_roles(&mut self) -> Result<(), WorldError> {
        let bind = |kind: EntityKind| -> Result<EntityId, WorldError> {
            let found = self.scenario.entities_by_kind(kind);
            match found {
                [] => Err(WorldError::MissingRole {
                    scenario: self.scenario.id.clone(),
                    kind,
                    found: 0,
                }),
                [only] => Ok(*only),
                [first, ..] => {
                    tracing::warn!(
                        scenario = %self.scenario.id,
                        ?kind,
                        found = found.len(),
                        "multiple entities for singleton role, keeping the first spawned"
                    );
                    Ok(*first)
                }
            }
        };

        self.goalkeeper = Some(bind(EntityKind::Goalkeeper)?);
        self.shooter = Some(bind(EntityKind::Shooter)?);
        self.ball = Some(bind(EntityKind::Ball)?);
        Ok(())
    }

    /// Arm the one-shot penalty trigger.
    pub fn start(&mut self, scheduler: &Scheduler, timing: &PenaltyTiming) {
        if self.phase != PenaltyPhase::Ready {
            tracing::warn!(scenario = %self.scenario.id, phase = ?self.phase, "start() ignored");
            return;
        }
        self.phase = PenaltyPhase::ShotInProgress;
        let token = scheduler.schedule(
            timing.pre_shot_delay,
            GameCommand::ExecutePenalty {
                scenario_id: self.scenario.id.clone(),
                run: self.run,
            },
        );
        self.pending.push(token);
    }

    /// Draw both zones, kick off the shot and the dive, classify the
    /// outcome. Returns `None` when the state machine is not armed.
    pub fn execute_penalty(
        &mut self,
        world: &mut World,
        scheduler: &Scheduler,
        timing: &PenaltyTiming,
    ) -> Option<(GoalZone, GoalZone, PenaltyResult)> {
        if self.phase != PenaltyPhase::ShotInProgress {
            tracing::warn!(scenario = %self.scenario.id, phase = ?self.phase, "execute_penalty ignored");
            return None;
        }

        let target = draw_zone(&mut world.rng);
        let keeper = draw_zone(&mut world.rng);
        tracing::info!(scenario = %self.scenario.id, ?target, ?keeper, "executing penalty");

        self.start_shot(world, scheduler, timing, target);
        self.start_keeper_move(world, keeper);

        let result = resolve(target, keeper);
        self.phase = PenaltyPhase::Resolved(result);
        Some((target, keeper, result))
    }

    /// Play the shooter's penalty run-up and schedule the ball impulse
    /// shortly before the animation's nominal end.
    fn start_shot(
        &mut self,
        world: &mut World,
        scheduler: &Scheduler,
        timing: &PenaltyTiming,
        target: GoalZone,
    ) {
        let (Some(shooter), Some(ball)) = (self.shooter, self.ball) else {
            return;
        };

        let duration = world
            .set_entity_animation(shooter, "penalty", 0.1, 1.0, false, true)
            .unwrap_or(0.0);

        let Some(ball_pos) = world.entity_translation(ball) else {
            tracing::error!(scenario = %self.scenario.id, "ball vanished before the shot");
            return;
        };
        let direction = normalize(sub(zone_position(target), ball_pos));
        // Fresh per-shot variance even for the same zone
        let factor: f64 = world.rng.gen();
        let impulse = vec3(
            direction.x * timing.base_force * factor,
            direction.y * timing.base_force * factor,
            direction.z * timing.lift_force * factor,
        );

        let lead = timing.impulse_lead.as_secs_f64();
        let delay = std::time::Duration::from_secs_f64((duration - lead).max(0.0));
        let token = scheduler.schedule(
            delay,
            GameCommand::ApplyShotImpulse {
                scenario_id: self.scenario.id.clone(),
                run: self.run,
                entity: ball,
                impulse,
            },
        );
        self.pending.push(token);
    }

    /// The keeper commits immediately: zone-specific dive, clamped on
    /// its final frame.
    fn start_keeper_move(&mut self, world: &mut World, zone: GoalZone) {
        let Some(goalkeeper) = self.goalkeeper else {
            return;
        };
        world.set_entity_animation(goalkeeper, keeper_animation(zone), 0.1, 1.0, false, true);
    }

    pub fn ball(&self) -> Option<EntityId> {
        self.ball
    }

    pub fn goalkeeper(&self) -> Option<EntityId> {
        self.goalkeeper
    }

    pub fn shooter(&self) -> Option<EntityId> {
        self.shooter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penalty_shared::vec3::length;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn save_iff_zones_match_for_all_81_pairs() {
        for target in GoalZone::ALL {
            for keeper in GoalZone::ALL {
                let expected = if target == keeper {
                    PenaltyResult::Save
                } else {
                    PenaltyResult::Goal
                };
                assert_eq!(resolve(target, keeper), expected, "{:?} vs {:?}", target, keeper);
            }
        }
    }

    #[test]
    fn draw_zone_only_produces_known_zones_and_hits_them_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            seen.insert(draw_zone(&mut rng));
        }
        assert_eq!(seen.len(), GoalZone::ALL.len());
    }

    #[test]
    fn every_zone_has_an_animation_and_a_position() {
        let mut names = std::collections::HashSet::new();
        for zone in GoalZone::ALL {
            names.insert(keeper_animation(zone));
            let pos = zone_position(zone);
            // All zones sit in the goal mouth plane
            assert!((pos.y - (-2.5)).abs() < 1e-12);
            assert!(length(pos) > 0.0);
        }
        assert_eq!(names.len(), 9, "dive animations must be distinct");
    }

    #[test]
    fn zone_columns_and_rows_cover_the_goal_mouth() {
        let xs: std::collections::BTreeSet<_> = GoalZone::ALL
            .iter()
            .map(|z| (zone_position(*z).x * 10.0) as i64)
            .collect();
        let zs: std::collections::BTreeSet<_> = GoalZone::ALL
            .iter()
            .map(|z| (zone_position(*z).z * 10.0) as i64)
            .collect();
        assert_eq!(xs.len(), 3);
        assert_eq!(zs.len(), 3);
    }
}
