//! Shared fixtures for the runtime integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tower_core::{GameConfig, Level, LevelBuilder, PlayerDefaults, Position, StoryDocument};
use tower_runtime::{
    BattleContext, BattleError, BattleProvider, BattleResult, EventQueue, FormulaBattleProvider,
    GameEvent, GameRuntime, InMemoryStorySource, NullDialogue, RecordingUi, StoryManager,
    TowerWorld,
};

pub type Scripted = Result<Option<BattleResult>, BattleError>;

/// Battle provider that replays canned answers and records every context.
#[derive(Default)]
pub struct ScriptedBattles {
    answers: Mutex<VecDeque<Scripted>>,
    contexts: Mutex<Vec<BattleContext>>,
}

impl ScriptedBattles {
    pub fn new(answers: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into_iter().collect()),
            contexts: Mutex::new(Vec::new()),
        })
    }

    pub fn contexts(&self) -> Vec<BattleContext> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl BattleProvider for ScriptedBattles {
    async fn run_battle(&self, context: BattleContext) -> Result<Option<BattleResult>, BattleError> {
        self.contexts.lock().unwrap().push(context);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(BattleError::LaunchFailed("no scripted answer".into())))
    }
}

pub struct Harness {
    pub game: GameRuntime,
    pub ui: Arc<RecordingUi>,
}

impl Harness {
    pub fn position(&self) -> Position {
        self.game.world().player().position
    }
}

/// A `width` x `height` level named "Lobby" with the spawn at the origin.
pub fn builder(width: u32, height: u32) -> LevelBuilder {
    let mut builder = Level::builder("Lobby", width, height);
    builder.spawn(Position::ORIGIN).unwrap();
    builder.walk_frames(4);
    builder.player_defaults(PlayerDefaults {
        hp: 100,
        atk: 10,
        def: 5,
        ..PlayerDefaults::default()
    });
    builder
}

pub fn harness(level: Level) -> Harness {
    harness_with(level, Arc::new(FormulaBattleProvider), InMemoryStorySource::new())
}

pub fn harness_with(
    level: Level,
    battles: Arc<dyn BattleProvider>,
    stories: InMemoryStorySource,
) -> Harness {
    harness_configured(level, battles, stories, |world| world)
}

/// Full control over the world before the runtime takes it.
pub fn harness_configured(
    level: Level,
    battles: Arc<dyn BattleProvider>,
    stories: InMemoryStorySource,
    configure: impl FnOnce(TowerWorld) -> TowerWorld,
) -> Harness {
    let ui = Arc::new(RecordingUi::new());
    let world = TowerWorld::new(
        level,
        GameConfig::default(),
        EventQueue::new(),
        ui.clone(),
        battles,
    )
    .with_seed(7);
    let world = configure(world);
    let story = StoryManager::new(Arc::new(stories), Arc::new(NullDialogue));
    let game = GameRuntime::new(world, story);
    ui.take_messages();
    Harness { game, ui }
}

pub fn story(json: serde_json::Value) -> StoryDocument {
    serde_json::from_value(json).unwrap()
}

/// Collects everything the observer channel has buffered so far.
pub fn drain_observed(rx: &mut tokio::sync::broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
