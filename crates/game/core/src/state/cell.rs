//! Grid cells.
//!
//! A cell is a single tagged value: the encounter data a door, item or
//! monster needs travels inside the variant, so a door cell without door data
//! (or a monster cell without stats) cannot be represented.

use serde::{Deserialize, Serialize};

use super::common::StairsDirection;
use crate::config::ItemDefaults;

/// Flat tile classification used by the move pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum TileType {
    Floor,
    Wall,
    Door,
    Key,
    Stairs,
    Hp,
    Atk,
    Def,
    Monster,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStats {
    pub name: String,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
}

impl MonsterStats {
    pub fn new(name: impl Into<String>, hp: i32, atk: i32, def: i32) -> Self {
        Self {
            name: name.into(),
            hp,
            atk,
            def,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Key,
    Hp,
    Atk,
    Def,
}

impl ItemKind {
    pub fn tile_type(self) -> TileType {
        match self {
            ItemKind::Key => TileType::Key,
            ItemKind::Hp => TileType::Hp,
            ItemKind::Atk => TileType::Atk,
            ItemKind::Def => TileType::Def,
        }
    }

    pub fn default_value(self, defaults: &ItemDefaults) -> i32 {
        match self {
            ItemKind::Key => defaults.key,
            ItemKind::Hp => defaults.hp,
            ItemKind::Atk => defaults.atk,
            ItemKind::Def => defaults.def,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub kind: ItemKind,
    /// `None` means "use the configured default for this kind".
    pub value: Option<i32>,
    /// Inventory gid; a key with a gid goes to the inventory instead of the key counter.
    pub gid: Option<String>,
    pub name: Option<String>,
}

impl ItemInfo {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            value: None,
            gid: None,
            name: None,
        }
    }

    pub fn with_value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_gid(mut self, gid: impl Into<String>, name: Option<String>) -> Self {
        self.gid = Some(gid.into());
        self.name = name;
        self
    }

    pub fn value_or_default(&self, defaults: &ItemDefaults) -> i32 {
        self.value.unwrap_or_else(|| self.kind.default_value(defaults))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorInfo {
    pub door_type: String,
    pub key_cost: u32,
    /// Inventory gid consumed (one unit) instead of generic keys.
    pub require: Option<String>,
    pub require_name: Option<String>,
    pub name: Option<String>,
}

impl DoorInfo {
    pub const DEFAULT_DOOR_TYPE: &'static str = "yellow";

    pub fn with_key_cost(key_cost: u32) -> Self {
        Self {
            door_type: Self::DEFAULT_DOOR_TYPE.to_string(),
            key_cost,
            require: None,
            require_name: None,
            name: None,
        }
    }

    pub fn requiring(mut self, gid: impl Into<String>, name: Option<String>) -> Self {
        self.require = Some(gid.into());
        self.require_name = name;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Floor,
    Wall,
    Door(DoorInfo),
    Item(ItemInfo),
    Monster(MonsterStats),
    Stairs(StairsDirection),
}

impl Cell {
    pub fn tile_type(&self) -> TileType {
        match self {
            Cell::Floor => TileType::Floor,
            Cell::Wall => TileType::Wall,
            Cell::Door(_) => TileType::Door,
            Cell::Item(item) => item.kind.tile_type(),
            Cell::Monster(_) => TileType::Monster,
            Cell::Stairs(_) => TileType::Stairs,
        }
    }

    pub fn is_floor(&self) -> bool {
        matches!(self, Cell::Floor)
    }

    pub fn door(&self) -> Option<&DoorInfo> {
        match self {
            Cell::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<&ItemInfo> {
        match self {
            Cell::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn monster(&self) -> Option<&MonsterStats> {
        match self {
            Cell::Monster(monster) => Some(monster),
            _ => None,
        }
    }
}
