//! Authoritative world state for one level.
//!
//! The grid is a vector of tagged [`Cell`]s; everything that is not encounter
//! data (unlocker links, story triggers, marker layers) lives in side-tables
//! keyed by [`TileKey`]. Runtime layers own a [`Level`] and a [`PlayerState`]
//! and mutate them only from event handlers.
mod catalog;
mod cell;
mod common;
mod error;
mod level;
mod player;

pub use catalog::ItemCatalog;
pub use cell::{Cell, DoorInfo, ItemInfo, ItemKind, MonsterStats, TileType};
pub use common::{Direction, Position, StairsDirection, TileKey, TileKeyParseError};
pub use error::LevelError;
pub use level::{DoorUnlocker, Level, LevelBuilder, MarkerLayer, StoryTrigger};
pub use player::{Inventory, InventoryEntry, PlayerDefaults, PlayerState, WalkCycle};
