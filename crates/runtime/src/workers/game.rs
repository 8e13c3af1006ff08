//! Game worker that owns the authoritative [`GameRuntime`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), applies
//! them, drains the event bus and only then replies, so a caller always
//! observes the settled state.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tower_core::Direction;

use crate::events::GameEvent;
use crate::game::{GameRuntime, GameSnapshot, InputOutcome};

/// Dialogue navigation requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoryAction {
    Next,
    Prev,
    Choose(usize),
    Close,
}

/// Commands that can be sent to the game worker.
pub enum Command {
    /// Directional input from the player.
    Move {
        direction: Direction,
        reply: oneshot::Sender<InputOutcome>,
    },
    StartStory {
        story_id: String,
        reply: oneshot::Sender<bool>,
    },
    Story {
        action: StoryAction,
        reply: oneshot::Sender<()>,
    },
    Restart {
        reply: oneshot::Sender<()>,
    },
    DebugSetAttributes {
        hp: Option<f64>,
        atk: Option<f64>,
        def: Option<f64>,
        reply: oneshot::Sender<()>,
    },
    DebugGrantItem {
        gid: String,
        count: f64,
        name: Option<String>,
        reply: oneshot::Sender<bool>,
    },
    /// Enqueue an arbitrary event (host-originated custom events).
    Emit {
        event: GameEvent,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Command::Move { .. } => "Move",
            Command::StartStory { .. } => "StartStory",
            Command::Story { .. } => "Story",
            Command::Restart { .. } => "Restart",
            Command::DebugSetAttributes { .. } => "DebugSetAttributes",
            Command::DebugGrantItem { .. } => "DebugGrantItem",
            Command::Emit { .. } => "Emit",
            Command::Snapshot { .. } => "Snapshot",
        }
    }
}

/// Background task that processes gameplay commands one at a time.
pub struct GameWorker {
    game: GameRuntime,
    command_rx: mpsc::Receiver<Command>,
    shutdown: CancellationToken,
}

impl GameWorker {
    pub fn new(
        game: GameRuntime,
        command_rx: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
    ) -> Self {
        info!(
            level = game.world().level().name(),
            spawn = %game.world().level().spawn().key(),
            "GameWorker initialized"
        );
        Self {
            game,
            command_rx,
            shutdown,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd).await;
                }
                else => break,
            }
        }
        self.game.bus_mut().stop();
        debug!("GameWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        let label = cmd.label();
        match cmd {
            Command::Move { direction, reply } => {
                let outcome = self.game.input(direction).await;
                self.settle().await;
                respond(reply, outcome, label);
            }
            Command::StartStory { story_id, reply } => {
                let started = self.game.start_story(&story_id).await;
                self.settle().await;
                respond(reply, started, label);
            }
            Command::Story { action, reply } => {
                match action {
                    StoryAction::Next => self.game.story_next(),
                    StoryAction::Prev => self.game.story_prev(),
                    StoryAction::Choose(index) => self.game.story_choose(index),
                    StoryAction::Close => self.game.story_close(),
                }
                self.settle().await;
                respond(reply, (), label);
            }
            Command::Restart { reply } => {
                self.game.restart();
                self.settle().await;
                respond(reply, (), label);
            }
            Command::DebugSetAttributes { hp, atk, def, reply } => {
                self.game.debug_set_attributes(hp, atk, def);
                respond(reply, (), label);
            }
            Command::DebugGrantItem {
                gid,
                count,
                name,
                reply,
            } => {
                let granted = self.game.debug_grant_item(&gid, count, name.as_deref());
                respond(reply, granted, label);
            }
            Command::Emit { event, reply } => {
                self.game.emit(event);
                self.settle().await;
                respond(reply, (), label);
            }
            Command::Snapshot { reply } => {
                respond(reply, self.game.snapshot(), label);
            }
        }
    }

    async fn settle(&mut self) {
        let dispatched = self.game.drain().await;
        if dispatched > 0 {
            debug!(dispatched, "drained event queue");
        }
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(command, "reply channel closed (caller dropped)");
    }
}
