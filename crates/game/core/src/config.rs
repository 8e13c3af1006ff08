use serde::{Deserialize, Serialize};

/// Game configuration constants and tunable parameters.
///
/// Every field has a default so partial TOML files deserialize cleanly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Stats the player starts with (and returns to on restart).
    pub player: PlayerConfig,
    /// Values used when an item object omits its `value` property.
    pub items: ItemDefaults,
    /// Stats used when a monster object omits `hp`/`atk`/`def`.
    pub monsters: MonsterDefaults,
    /// Keys consumed by a door that declares no `keyCost`.
    pub door_key_cost: u32,
    /// Edge length of one grid cell in map pixels.
    pub cell_size: u32,
}

impl GameConfig {
    pub const DEFAULT_DOOR_KEY_COST: u32 = 1;
    pub const DEFAULT_CELL_SIZE: u32 = 48;

    pub fn new() -> Self {
        Self {
            player: PlayerConfig::default(),
            items: ItemDefaults::default(),
            monsters: MonsterDefaults::default(),
            door_key_cost: Self::DEFAULT_DOOR_KEY_COST,
            cell_size: Self::DEFAULT_CELL_SIZE,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub keys: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Traveler".to_string(),
            hp: 100,
            atk: 0,
            def: 0,
            keys: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefaults {
    pub key: i32,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self {
            key: 1,
            hp: 50,
            atk: 3,
            def: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterDefaults {
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
}

impl Default for MonsterDefaults {
    fn default() -> Self {
        Self {
            hp: 20,
            atk: 5,
            def: 0,
        }
    }
}
