//! Deterministic tower-climb rules and data types shared across crates.
//!
//! `tower-core` defines the canonical world model (the tagged [`Cell`] grid,
//! per-cell side-tables, player state and inventory), the deterministic
//! fallback battle formula, the equipment reward pool and the story document
//! format. Runtime layers own a [`Level`] and a [`PlayerState`] and mutate them
//! only from inside event handlers; nothing here performs I/O.
pub mod combat;
pub mod config;
pub mod error;
pub mod state;
pub mod story;

pub use combat::{
    ALL_EQUIPMENT, BattleForecast, EquipmentBonus, EquipmentDefinition, HpLoss, equipment_bonus,
    equipment_definition, forecast, forecast_for, pick_equipment_reward,
};
pub use config::{GameConfig, ItemDefaults, MonsterDefaults, PlayerConfig};
pub use error::{ErrorSeverity, GameError};
pub use state::{
    Cell, Direction, DoorInfo, DoorUnlocker, Inventory, InventoryEntry, ItemCatalog, ItemInfo,
    ItemKind, Level, LevelBuilder, LevelError, MarkerLayer, MonsterStats, PlayerDefaults,
    PlayerState, Position, StairsDirection, StoryTrigger, TileKey, TileKeyParseError, TileType,
    WalkCycle,
};
pub use story::{StoryDocument, StoryNode, StoryNodeEvent, StoryOption, StoryReward};
