//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! moving, driving dialogue and observing dispatched events.
use tokio::sync::{broadcast, mpsc, oneshot};

use tower_core::Direction;

use super::errors::{Result, RuntimeError};
use crate::events::GameEvent;
use crate::game::{GameSnapshot, InputOutcome};
use crate::workers::{Command, StoryAction};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    observers: broadcast::Sender<GameEvent>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        observers: broadcast::Sender<GameEvent>,
    ) -> Self {
        Self {
            command_tx,
            observers,
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Moves the player one cell and waits until every resulting event settled.
    ///
    /// A monster battle on the way keeps this pending until the battle
    /// provider answers.
    pub async fn move_player(&self, direction: Direction) -> Result<InputOutcome> {
        self.request(|reply| Command::Move { direction, reply }).await
    }

    pub async fn start_story(&self, story_id: impl Into<String>) -> Result<bool> {
        let story_id = story_id.into();
        self.request(|reply| Command::StartStory { story_id, reply })
            .await
    }

    pub async fn story_next(&self) -> Result<()> {
        self.story(StoryAction::Next).await
    }

    pub async fn story_prev(&self) -> Result<()> {
        self.story(StoryAction::Prev).await
    }

    pub async fn story_choose(&self, index: usize) -> Result<()> {
        self.story(StoryAction::Choose(index)).await
    }

    pub async fn story_close(&self) -> Result<()> {
        self.story(StoryAction::Close).await
    }

    async fn story(&self, action: StoryAction) -> Result<()> {
        self.request(|reply| Command::Story { action, reply }).await
    }

    /// Resets the player to the level defaults at the spawn cell.
    pub async fn restart(&self) -> Result<()> {
        self.request(|reply| Command::Restart { reply }).await
    }

    pub async fn debug_set_attributes(
        &self,
        hp: Option<f64>,
        atk: Option<f64>,
        def: Option<f64>,
    ) -> Result<()> {
        self.request(|reply| Command::DebugSetAttributes { hp, atk, def, reply })
            .await
    }

    pub async fn debug_grant_item(
        &self,
        gid: impl Into<String>,
        count: f64,
        name: Option<String>,
    ) -> Result<bool> {
        let gid = gid.into();
        self.request(|reply| Command::DebugGrantItem {
            gid,
            count,
            name,
            reply,
        })
        .await
    }

    /// Enqueues `event` and drains the bus.
    pub async fn emit(&self, event: GameEvent) -> Result<()> {
        self.request(|reply| Command::Emit { event, reply }).await
    }

    /// Query the current session state (read-only snapshot)
    pub async fn snapshot(&self) -> Result<GameSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to every event the bus dispatches from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.observers.subscribe()
    }
}
