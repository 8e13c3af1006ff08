//! High-level runtime orchestrator.
//!
//! The runtime owns the game worker, wires up the command channel, and
//! exposes a builder-based API for hosts to assemble a session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tower_core::{GameConfig, Level};

use crate::api::{BattleProvider, FormulaBattleProvider, Result, RuntimeError, RuntimeHandle};
use crate::battle::{
    BattleCanceller, BattleRequest, ChannelBattleProvider, DEFAULT_BATTLE_TIMEOUT,
    MiniGameRegistry,
};
use crate::context::TowerContext;
use crate::events::{EventHandler, EventKind, EventQueue};
use crate::game::GameRuntime;
use crate::story::{DialogueView, InMemoryStorySource, NullDialogue, StoryManager, StorySource};
use crate::ui::{NullUi, UiHooks};
use crate::workers::{Command, GameWorker};
use crate::world::{FloorProgress, FloorSource, StairsBehaviour, TowerWorld};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_buffer_size: usize,
    /// Observer channel capacity for [`RuntimeHandle::subscribe_events`].
    pub event_buffer_size: usize,
    /// Applied to interactive battles; `None` waits forever.
    pub battle_timeout: Option<Duration>,
    /// Grant a random equipment piece when a monster is defeated.
    pub equipment_rewards: bool,
    /// Seeds battle contexts and the equipment roll.
    pub seed: u64,
    pub stairs: StairsBehaviour,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_buffer_size: 100,
            battle_timeout: Some(DEFAULT_BATTLE_TIMEOUT),
            equipment_rewards: false,
            seed: 0,
            stairs: StairsBehaviour::CompleteLevel,
        }
    }
}

/// Main runtime that owns the game worker.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Token cancelled on shutdown; pending interactive battles observe it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        drop(self.handle);
        self.worker.await.map_err(RuntimeError::WorkerJoin)?;
        info!("runtime stopped");
        Ok(())
    }
}

type Subscription = (EventKind, Arc<dyn EventHandler<TowerContext>>);

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    game_config: GameConfig,
    level: Option<Level>,
    ui: Arc<dyn UiHooks>,
    dialogue: Arc<dyn DialogueView>,
    stories: Arc<dyn StorySource>,
    battles: Option<Arc<dyn BattleProvider>>,
    mini_games: MiniGameRegistry,
    floors: Option<Arc<dyn FloorSource>>,
    subscriptions: Vec<Subscription>,
    shutdown: CancellationToken,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            game_config: GameConfig::default(),
            level: None,
            ui: Arc::new(NullUi),
            dialogue: Arc::new(NullDialogue),
            stories: Arc::new(InMemoryStorySource::new()),
            battles: None,
            mini_games: MiniGameRegistry::new(),
            floors: None,
            subscriptions: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Set the starting level (required)
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn ui(mut self, ui: Arc<dyn UiHooks>) -> Self {
        self.ui = ui;
        self
    }

    pub fn dialogue(mut self, view: Arc<dyn DialogueView>) -> Self {
        self.dialogue = view;
        self
    }

    pub fn stories(mut self, source: Arc<dyn StorySource>) -> Self {
        self.stories = source;
        self
    }

    /// Set the battle provider; defaults to [`FormulaBattleProvider`].
    pub fn battle_provider(mut self, provider: Arc<dyn BattleProvider>) -> Self {
        self.battles = Some(provider);
        self
    }

    pub fn mini_games(mut self, registry: MiniGameRegistry) -> Self {
        self.mini_games = registry;
        self
    }

    /// Routes battles to the host through a request channel.
    ///
    /// Uses the battle timeout and mini-games configured so far.
    pub fn interactive_battles(
        mut self,
        buffer: usize,
    ) -> (Self, mpsc::Receiver<BattleRequest>, BattleCanceller) {
        let (provider, requests) = ChannelBattleProvider::new(buffer);
        let provider = provider
            .with_timeout(self.config.battle_timeout)
            .with_shutdown(self.shutdown.child_token())
            .with_mini_games(&self.mini_games);
        let canceller = provider.canceller();
        self.battles = Some(Arc::new(provider));
        (self, requests, canceller)
    }

    /// Enables floor progression backed by `source`.
    pub fn floors(mut self, source: Arc<dyn FloorSource>) -> Self {
        self.floors = Some(source);
        self.config.stairs = StairsBehaviour::Floors;
        self
    }

    /// Subscribes an extra handler after the built-in ones.
    pub fn subscribe(mut self, kind: EventKind, handler: Arc<dyn EventHandler<TowerContext>>) -> Self {
        self.subscriptions.push((kind, handler));
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<Runtime> {
        let level = self.level.ok_or(RuntimeError::MissingLevel)?;
        let battles = self
            .battles
            .unwrap_or_else(|| Arc::new(FormulaBattleProvider));

        let mut world = TowerWorld::new(level, self.game_config, EventQueue::new(), self.ui, battles)
            .with_seed(self.config.seed)
            .with_mini_games(self.mini_games)
            .with_equipment_rewards(self.config.equipment_rewards);
        if self.config.stairs == StairsBehaviour::Floors {
            let source = self.floors.ok_or(RuntimeError::MissingFloorSource)?;
            world = world.with_floors(FloorProgress::new(source));
        }

        let story = StoryManager::new(self.stories, self.dialogue);
        let mut game = GameRuntime::with_capacity(world, story, self.config.event_buffer_size);
        for (kind, handler) in self.subscriptions {
            game.bus_mut().subscribe(kind, handler);
        }

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let observers = game.bus().observer_sender();
        let handle = RuntimeHandle::new(command_tx, observers);

        let worker = GameWorker::new(game, command_rx, self.shutdown.clone());
        let worker = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            shutdown: self.shutdown,
            worker,
        })
    }
}
