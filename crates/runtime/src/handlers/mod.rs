//! Bus handlers that make up the move pipeline and encounter resolution.
//!
//! Each handler reacts to one event kind. Resolvers never move the player
//! themselves; they enqueue a commit (or a blocked event) and let
//! [`MoveCommitHandler`] apply it.

mod custom;
mod door;
mod item;
mod monster;
mod movement;
mod stairs;

pub use custom::{ArticleUnlockHandler, DebugLogHandler};
pub use door::DoorEncounterHandler;
pub use item::ItemPickupHandler;
pub use monster::MonsterEncounterHandler;
pub use movement::{MoveAttemptHandler, MoveBlockedHandler, MoveCommitHandler};
pub use stairs::StairsEncounterHandler;

use std::sync::Arc;

use crate::context::TowerContext;
use crate::events::{EventBus, EventKind};

/// Subscribes the built-in handlers, one per event kind.
pub fn register_default_handlers(bus: &mut EventBus<TowerContext>) {
    bus.subscribe(EventKind::MoveAttempt, Arc::new(MoveAttemptHandler));
    bus.subscribe(EventKind::MoveBlocked, Arc::new(MoveBlockedHandler));
    bus.subscribe(EventKind::MoveCommit, Arc::new(MoveCommitHandler));
    bus.subscribe(EventKind::DoorEncounter, Arc::new(DoorEncounterHandler));
    bus.subscribe(EventKind::ItemEncounter, Arc::new(ItemPickupHandler));
    bus.subscribe(EventKind::MonsterEncounter, Arc::new(MonsterEncounterHandler));
    bus.subscribe(EventKind::StairsEncounter, Arc::new(StairsEncounterHandler));
    bus.subscribe(
        EventKind::custom(EventKind::ARTICLE_UNLOCK),
        Arc::new(ArticleUnlockHandler),
    );
    bus.subscribe(
        EventKind::custom(EventKind::DEBUG_CONSOLE_LOG),
        Arc::new(DebugLogHandler),
    );
}
