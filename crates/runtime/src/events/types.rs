//! Event taxonomy carried by the gameplay bus.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tower_core::{Position, StairsDirection, TileKey, TileType};

/// Provenance of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trigger {
    Player,
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MoveBlockReason {
    Wall,
    Door,
    Entity,
    Monster,
    Keys,
    Bounds,
}

/// Dispatch key of an event; custom events are keyed by their type string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    MoveAttempt,
    MoveBlocked,
    MoveCommit,
    DoorEncounter,
    ItemEncounter,
    MonsterEncounter,
    StairsEncounter,
    Custom(String),
}

impl EventKind {
    pub const ARTICLE_UNLOCK: &'static str = "article.unlock";
    pub const DEBUG_CONSOLE_LOG: &'static str = "debug.console.log";

    pub fn custom(name: impl Into<String>) -> Self {
        EventKind::Custom(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::MoveAttempt => "player.move.attempt",
            EventKind::MoveBlocked => "player.move.blocked",
            EventKind::MoveCommit => "player.move.commit",
            EventKind::DoorEncounter => "encounter.door",
            EventKind::ItemEncounter => "encounter.item",
            EventKind::MonsterEncounter => "encounter.monster",
            EventKind::StairsEncounter => "encounter.stairs",
            EventKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    MoveAttempt {
        from: Position,
        to: Position,
    },
    MoveBlocked {
        reason: MoveBlockReason,
        position: Position,
        message: Option<String>,
    },
    MoveCommit {
        from: Position,
        to: Position,
        /// Advance the walk-cycle frame when applying the move.
        advance_frame: bool,
    },
    DoorEncounter {
        position: Position,
    },
    ItemEncounter {
        position: Position,
        tile_type: TileType,
    },
    MonsterEncounter {
        position: Position,
    },
    StairsEncounter {
        position: Position,
        direction: StairsDirection,
    },
    /// Narrative-originated or host-originated event with a free-form payload.
    Custom {
        name: String,
        payload: Value,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub trigger: Trigger,
    pub payload: EventPayload,
}

impl GameEvent {
    pub fn new(trigger: Trigger, payload: EventPayload) -> Self {
        Self { trigger, payload }
    }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::MoveAttempt { .. } => EventKind::MoveAttempt,
            EventPayload::MoveBlocked { .. } => EventKind::MoveBlocked,
            EventPayload::MoveCommit { .. } => EventKind::MoveCommit,
            EventPayload::DoorEncounter { .. } => EventKind::DoorEncounter,
            EventPayload::ItemEncounter { .. } => EventKind::ItemEncounter,
            EventPayload::MonsterEncounter { .. } => EventKind::MonsterEncounter,
            EventPayload::StairsEncounter { .. } => EventKind::StairsEncounter,
            EventPayload::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }

    /// Tile key of the cell the event is about, when it has one.
    pub fn tile_key(&self) -> Option<TileKey> {
        match &self.payload {
            EventPayload::MoveAttempt { to, .. } | EventPayload::MoveCommit { to, .. } => {
                Some(to.key())
            }
            EventPayload::MoveBlocked { position, .. }
            | EventPayload::DoorEncounter { position }
            | EventPayload::ItemEncounter { position, .. }
            | EventPayload::MonsterEncounter { position }
            | EventPayload::StairsEncounter { position, .. } => Some(position.key()),
            EventPayload::Custom { .. } => None,
        }
    }

    pub fn move_attempt(from: Position, to: Position) -> Self {
        Self::new(Trigger::Player, EventPayload::MoveAttempt { from, to })
    }

    pub fn move_blocked(
        reason: MoveBlockReason,
        position: Position,
        message: impl Into<Option<String>>,
    ) -> Self {
        Self::new(
            Trigger::System,
            EventPayload::MoveBlocked {
                reason,
                position,
                message: message.into(),
            },
        )
    }

    pub fn move_commit(from: Position, to: Position, advance_frame: bool) -> Self {
        Self::new(
            Trigger::System,
            EventPayload::MoveCommit {
                from,
                to,
                advance_frame,
            },
        )
    }

    pub fn custom(trigger: Trigger, name: impl Into<String>, payload: Value) -> Self {
        Self::new(
            trigger,
            EventPayload::Custom {
                name: name.into(),
                payload,
            },
        )
    }
}
