//! Headless test client: connects to a running penalty server, watches
//! penalty results and restarts the scenario a few times.
//!
//! Usage: kickbot [ws://host:port/ws] [rounds]

use futures_util::{SinkExt, StreamExt};
use penalty_shared::protocol::{ClientMsg, ServerMsg};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "ws://127.0.0.1:9001/ws".to_string());
    let rounds: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", url, e);
            std::process::exit(1);
        }
    };
    tracing::info!(%url, rounds, "kickbot connected");

    let mut seen_results = 0u32;
    loop {
        let msg = match tokio::time::timeout(Duration::from_secs(30), ws.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                tracing::error!(error = %e, "websocket error");
                break;
            }
            Ok(None) => {
                tracing::info!("server closed the connection");
                break;
            }
            Err(_) => {
                tracing::error!("no message within 30s, giving up");
                break;
            }
        };

        let Message::Text(text) = msg else { continue };
        let Ok(server_msg) = serde_json::from_str::<ServerMsg>(&text) else {
            tracing::warn!("unparseable server message");
            continue;
        };

        match server_msg {
            ServerMsg::Welcome(welcome) => {
                tracing::info!(
                    self_id = welcome.self_id,
                    scenarios = welcome.scenarios.len(),
                    "welcome received"
                );
            }
            ServerMsg::ScenarioState(state) => {
                tracing::debug!(scenario = %state.scenario_id, phase = ?state.phase, "phase change");
            }
            ServerMsg::PenaltyResult(result) => {
                seen_results += 1;
                println!(
                    "round {}: shot at {:?}, keeper {:?} -> {:?}",
                    seen_results, result.target_zone, result.keeper_zone, result.result
                );
                if seen_results >= rounds {
                    break;
                }
                // Brief pause so the resolved pose is visible to observers
                tokio::time::sleep(Duration::from_millis(500)).await;
                let json = match serde_json::to_string(&ClientMsg::RestartScenario) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "serialize failed");
                        break;
                    }
                };
                if ws.send(Message::Text(json.into())).await.is_err() {
                    tracing::error!("send failed");
                    break;
                }
            }
            ServerMsg::EntityState(_) => {}
        }
    }

    let _ = ws.close(None).await;
    println!("kickbot done: {} results seen", seen_results);
}
