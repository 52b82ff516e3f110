//! Runs a [`Level`] on its own task.
//!
//! The task owns the level outright. Clock ticks and caller requests are
//! handled one at a time in arrival order, so no request ever observes a
//! half-applied move. Replies come back on a oneshot, level events go out
//! on a broadcast channel.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Difficulty;
use crate::error::{DriverError, LevelError};
use crate::level::Level;
use crate::types::{Direction, EntityId, LevelEvent, LevelSnapshot, MoveOutcome};

const COMMAND_QUEUE: usize = 256;
const EVENT_QUEUE: usize = 256;

enum Command {
    Start {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Join {
        reply: oneshot::Sender<Result<EntityId, LevelError>>,
    },
    Move {
        entity: EntityId,
        dir: Direction,
        reply: oneshot::Sender<Result<MoveOutcome, LevelError>>,
    },
    SetInterval {
        ghost: EntityId,
        interval_ms: u64,
        reply: oneshot::Sender<Result<(), LevelError>>,
    },
    SetDifficulty {
        difficulty: Difficulty,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<LevelSnapshot>,
    },
    Query {
        run: Box<dyn FnOnce(&Level) + Send>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Clone)]
pub struct LevelHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<LevelEvent>,
}

/// Moves `level` onto a new task that advances it every `tick`. The task
/// ends on [`LevelHandle::shutdown`] or once every handle is dropped, and
/// hands the level back through its join handle.
pub fn spawn(level: Level, tick: Duration) -> (LevelHandle, JoinHandle<Level>) {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);
    let (events_tx, _) = broadcast::channel(EVENT_QUEUE);
    let task = tokio::spawn(run(level, tick, commands_rx, events_tx.clone()));
    (
        LevelHandle {
            commands: commands_tx,
            events: events_tx,
        },
        task,
    )
}

impl LevelHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<LevelEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| DriverError::Closed)?;
        response.await.map_err(|_| DriverError::Closed)
    }

    pub async fn start(&self) -> Result<(), DriverError> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// Once this returns no further ghost move happens until the next start.
    pub async fn stop(&self) -> Result<(), DriverError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Creates a player and places it on the next start cell.
    pub async fn join(&self) -> Result<EntityId, DriverError> {
        Ok(self.request(|reply| Command::Join { reply }).await??)
    }

    pub async fn move_entity(
        &self,
        entity: EntityId,
        dir: Direction,
    ) -> Result<MoveOutcome, DriverError> {
        Ok(self
            .request(|reply| Command::Move { entity, dir, reply })
            .await??)
    }

    pub async fn set_move_interval(
        &self,
        ghost: EntityId,
        interval_ms: u64,
    ) -> Result<(), DriverError> {
        Ok(self
            .request(|reply| Command::SetInterval {
                ghost,
                interval_ms,
                reply,
            })
            .await??)
    }

    pub async fn set_difficulty(&self, difficulty: Difficulty) -> Result<(), DriverError> {
        self.request(|reply| Command::SetDifficulty { difficulty, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<LevelSnapshot, DriverError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Runs a read-only closure against the level inside the task.
    pub async fn query<T, F>(&self, f: F) -> Result<T, DriverError>
    where
        T: Send + 'static,
        F: FnOnce(&Level) -> T + Send + 'static,
    {
        self.request(|reply| Command::Query {
            run: Box::new(move |level| {
                let _ = reply.send(f(level));
            }),
        })
        .await
    }

    /// Stops the level and ends the task.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

async fn run(
    mut level: Level,
    tick: Duration,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<LevelEvent>,
) -> Level {
    let tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    info!(tick_ms, "level driver running");

    loop {
        let flow = tokio::select! {
            _ = interval.tick() => {
                if let Err(error) = level.tick(tick_ms) {
                    warn!(%error, "level tick failed");
                }
                ControlFlow::Continue(())
            }
            command = commands.recv() => match command {
                Some(command) => handle(&mut level, command),
                None => {
                    debug!("every level handle dropped");
                    level.stop();
                    ControlFlow::Break(())
                }
            },
        };
        publish(&mut level, &events);
        if flow.is_break() {
            break;
        }
    }

    info!("level driver finished");
    level
}

fn handle(level: &mut Level, command: Command) -> ControlFlow<()> {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Start { reply } => {
            level.start();
            let _ = reply.send(());
        }
        Command::Stop { reply } => {
            level.stop();
            let _ = reply.send(());
        }
        Command::Join { reply } => {
            let player = level.create_player();
            let _ = reply.send(level.register_player(player).map(|()| player));
        }
        Command::Move { entity, dir, reply } => {
            let _ = reply.send(level.move_entity(entity, dir));
        }
        Command::SetInterval {
            ghost,
            interval_ms,
            reply,
        } => {
            let _ = reply.send(level.set_move_interval(ghost, interval_ms));
        }
        Command::SetDifficulty { difficulty, reply } => {
            level.set_difficulty(difficulty);
            let _ = reply.send(());
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(level.snapshot());
        }
        Command::Query { run } => run(level),
        Command::Shutdown { reply } => {
            level.stop();
            let _ = reply.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

fn publish(level: &mut Level, events: &broadcast::Sender<LevelEvent>) {
    for event in level.drain_events() {
        // No subscribers is fine; the event is simply dropped.
        let _ = events.send(event);
    }
}
