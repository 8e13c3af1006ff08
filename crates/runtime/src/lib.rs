//! Runtime orchestration for the tower-climb game.
//!
//! This crate wires the event bus, the move pipeline and its encounter
//! handlers, the battle provider abstraction and the story state machine into
//! one session. Hosts embed [`Runtime`] and talk to it through
//! [`RuntimeHandle`], or drive a [`GameRuntime`] directly in tests and tools.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the handle, errors and the battle provider trait
//! - [`events`] provides the queue-backed event bus and event taxonomy
//! - [`handlers`] resolves moves and encounters
//! - [`world`] owns the level, the player and floor progression
//! - [`story`] runs dialogue sessions
//! - [`battle`] defines the battle contract and the interactive provider
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod battle;
pub mod context;
pub mod events;
pub mod game;
pub mod handlers;
pub mod journal;
pub mod runtime;
pub mod story;
pub mod ui;
pub mod world;

mod workers;

pub use api::{BattleProvider, FormulaBattleProvider, Result, RuntimeError, RuntimeHandle};
pub use battle::{
    AttributeChanges, BattleCanceller, BattleContext, BattleError, BattleOutcome, BattleRequest,
    BattleResult, BattleRewards, ChannelBattleProvider, InventoryReward, MiniGameDescriptor,
    MiniGameRegistry, MonsterChanges,
};
pub use context::TowerContext;
pub use events::{
    EventBus, EventHandler, EventKind, EventPayload, EventQueue, GameEvent, HandlerError,
    MoveBlockReason, SubscriptionId, Trigger,
};
pub use game::{GameRuntime, GameSnapshot, InputOutcome};
pub use handlers::register_default_handlers;
pub use journal::{Journal, JournalEntry};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use story::{
    DialogueState, DialogueView, DirectoryStorySource, GrantOutcome, InMemoryStorySource,
    NullDialogue, StoryCallbacks, StoryError, StoryManager, StorySource,
};
pub use ui::{NullUi, RecordingUi, UiHooks};
pub use world::{
    DirectoryFloorSource, FloorError, FloorProgress, FloorSource, MoveAttempt, StairsBehaviour,
    TowerWorld,
};
