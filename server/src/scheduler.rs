//! Cancellable one-shot timers.
//!
//! Scenario sub-events (the penalty trigger, the shot impulse) fire
//! against wall-clock time, independent of the frame loop: each timer is
//! a detached sleep task that posts a command back into the game loop
//! channel unless its token was cancelled first. Firing order relative
//! to frame boundaries is deliberately unspecified.

use crate::game_loop::GameCommand;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Cancellation handle for one scheduled command.
#[derive(Debug, Clone)]
pub struct TimerToken {
    cancelled: Arc<AtomicBool>,
}

impl TimerToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Schedules delayed one-shot commands into the game loop.
#[derive(Clone)]
pub struct Scheduler {
    game_tx: mpsc::Sender<GameCommand>,
}

impl Scheduler {
    pub fn new(game_tx: mpsc::Sender<GameCommand>) -> Self {
        Self { game_tx }
    }

    /// Post `cmd` to the game loop after `delay`, unless the returned
    /// token is cancelled before the timer fires.
    pub fn schedule(&self, delay: Duration, cmd: GameCommand) -> TimerToken {
        let cancelled = Arc::new(AtomicBool::new(false));
        let token = TimerToken {
            cancelled: cancelled.clone(),
        };
        let game_tx = self.game_tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if cancelled.load(Ordering::Relaxed) {
                tracing::debug!("cancelled timer dropped");
                return;
            }
            if game_tx.send(cmd).await.is_err() {
                tracing::debug!("timer fired after game loop ended");
            }
        });

        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scheduled_command_arrives_after_the_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = Scheduler::new(tx);
        scheduler.schedule(Duration::from_millis(10), GameCommand::RestartScenario);

        let cmd = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("timer did not fire")
            .expect("channel closed");
        assert!(matches!(cmd, GameCommand::RestartScenario));
    }

    #[tokio::test]
    async fn cancelled_timer_never_delivers() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = Scheduler::new(tx);
        let token = scheduler.schedule(Duration::from_millis(20), GameCommand::RestartScenario);
        token.cancel();
        assert!(token.is_cancelled());

        let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(outcome.is_err(), "cancelled command was delivered");
    }
}
