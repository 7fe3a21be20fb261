use crate::config::ServerConfig;
use crate::entity::EntityId;
use crate::scene::{load_scene, SceneAsset};
use crate::scheduler::Scheduler;
use crate::world::World;
use penalty_shared::protocol::{
    PenaltyResultMsg, ScenarioStateMsg, WelcomeMsg, PROTOCOL_VERSION,
};
use penalty_shared::vec3::Vec3;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands into the game loop: client connections, timers and the
/// asynchronous scene load all post here.
pub enum GameCommand {
    ClientJoin {
        response: oneshot::Sender<(u32, WelcomeMsg)>,
    },
    ClientLeave {
        id: u32,
    },
    Shoot {
        client_id: u32,
    },
    RestartScenario,
    LaunchScenario {
        id: String,
    },
    SceneLoaded(SceneAsset),
    SceneFailed {
        path: String,
        reason: String,
    },
    /// Deferred penalty trigger armed by the scenario.
    ExecutePenalty {
        scenario_id: String,
        run: u32,
    },
    /// Deferred ball impulse armed by the shot.
    ApplyShotImpulse {
        scenario_id: String,
        run: u32,
        entity: EntityId,
        impulse: Vec3,
    },
}

/// Broadcasts from the game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    EntityState(penalty_shared::protocol::EntityStateMsg),
    ScenarioState(ScenarioStateMsg),
    PenaltyResult(PenaltyResultMsg),
}

/// Run the main game loop. Owns the world and all game state.
pub async fn run_game_loop(
    game_tx: mpsc::Sender<GameCommand>,
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    config: ServerConfig,
) {
    let mut world = World::new(config.rng_seed);
    let scheduler = Scheduler::new(game_tx.clone());
    let timing = config.timing.clone();

    // Load the scene off the loop; the world stays paused until it lands
    {
        let game_tx = game_tx.clone();
        let path = config.scene_path.clone();
        tokio::spawn(async move {
            let cmd = match load_scene(&path).await {
                Ok(scene) => GameCommand::SceneLoaded(scene),
                Err(e) => GameCommand::SceneFailed {
                    path,
                    reason: e.to_string(),
                },
            };
            let _ = game_tx.send(cmd).await;
        });
    }

    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate_hz as f64);
    let broadcast_every_n = config.tick_rate_hz / config.broadcast_rate_hz;
    let mut tick_count: u64 = 0;
    let mut next_client_id: u32 = 1;
    let mut last_phase: Option<ScenarioStateMsg> = None;

    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let dt = 1.0 / config.tick_rate_hz as f64;
                world.update(dt);

                // Broadcast entity poses at the lower rate
                tick_count += 1;
                if tick_count % broadcast_every_n as u64 == 0 {
                    let _ = broadcast_tx.send(GameBroadcast::EntityState(world.entity_state()));
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    GameCommand::ClientJoin { response } => {
                        let client_id = next_client_id;
                        next_client_id += 1;
                        let welcome = WelcomeMsg {
                            protocol_version: PROTOCOL_VERSION,
                            server_version: env!("CARGO_PKG_VERSION").to_string(),
                            self_id: client_id,
                            scenarios: world.scenario_wires(),
                        };
                        let _ = response.send((client_id, welcome));
                    }
                    GameCommand::ClientLeave { id } => {
                        tracing::info!("Client {} left", id);
                    }
                    GameCommand::Shoot { client_id } => {
                        tracing::debug!(client_id, "shoot requested");
                        world.shoot_to_goal();
                    }
                    GameCommand::RestartScenario => {
                        if let Err(e) = world.restart_scenario(&scheduler, &timing) {
                            tracing::warn!(error = %e, "restart failed");
                        }
                    }
                    GameCommand::LaunchScenario { id } => {
                        if let Err(e) = world.launch_scenario(&id, &scheduler, &timing) {
                            tracing::warn!(scenario = %id, error = %e, "launch failed");
                        }
                    }
                    GameCommand::SceneLoaded(scene) => {
                        world.install_scene(scene);
                        world.set_time_scale(1.0);
                        match world.default_scenario_id() {
                            Some(id) => {
                                if let Err(e) = world.launch_scenario(&id, &scheduler, &timing) {
                                    tracing::error!(scenario = %id, error = %e, "initial launch failed");
                                }
                            }
                            None => tracing::warn!("scene carries no scenarios"),
                        }
                    }
                    GameCommand::SceneFailed { path, reason } => {
                        tracing::warn!(%path, %reason, "scene load failed, using the placeholder");
                        let _ = game_tx.send(GameCommand::SceneLoaded(SceneAsset::placeholder())).await;
                    }
                    GameCommand::ExecutePenalty { scenario_id, run } => {
                        if let Some((target_zone, keeper_zone, result)) =
                            world.execute_penalty(&scenario_id, run, &scheduler, &timing)
                        {
                            let _ = broadcast_tx.send(GameBroadcast::PenaltyResult(PenaltyResultMsg {
                                scenario_id,
                                target_zone,
                                keeper_zone,
                                result,
                            }));
                        }
                    }
                    GameCommand::ApplyShotImpulse { scenario_id, run, entity, impulse } => {
                        world.apply_shot_impulse(&scenario_id, run, entity, impulse);
                    }
                }
            }

            else => break,
        }

        // Phase transitions are broadcast edge-triggered, whatever caused them
        let phase = world.scenario_phase();
        if phase != last_phase {
            if let Some(msg) = &phase {
                let _ = broadcast_tx.send(GameBroadcast::ScenarioState(msg.clone()));
            }
            last_phase = phase;
        }
    }

    tracing::info!("Game loop ended");
}
