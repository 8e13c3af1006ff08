//! Player state, inventory and walk animation bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog::ItemCatalog;
use super::common::{Direction, Position};
use crate::config::PlayerConfig;

/// Item counts keyed by inventory gid.
///
/// Counts are always positive: an entry that would drop to zero is removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds at least one unit of `gid` and returns the new count.
    pub fn add(&mut self, gid: &str, quantity: i64) -> u32 {
        let quantity = clamp_quantity(quantity);
        let count = self.items.entry(gid.to_string()).or_insert(0);
        *count = count.saturating_add(quantity);
        *count
    }

    /// Removes `quantity` (at least one) units of `gid`.
    ///
    /// Returns `false` without touching the inventory when the count is short.
    pub fn consume(&mut self, gid: &str, quantity: i64) -> bool {
        let required = clamp_quantity(quantity);
        let current = self.count(gid);
        if current < required {
            return false;
        }
        let remaining = current - required;
        if remaining > 0 {
            self.items.insert(gid.to_string(), remaining);
        } else {
            self.items.remove(gid);
        }
        true
    }

    pub fn count(&self, gid: &str) -> u32 {
        self.items.get(gid).copied().unwrap_or(0)
    }

    pub fn contains(&self, gid: &str) -> bool {
        self.items.contains_key(gid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(gid, count)| (gid.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inventory listing with display names, sorted by name.
    pub fn entries(&self, catalog: &ItemCatalog) -> Vec<InventoryEntry> {
        let mut entries: Vec<_> = self
            .iter()
            .map(|(gid, count)| InventoryEntry {
                gid: gid.to_string(),
                name: catalog.display_name(Some(gid), None),
                count,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(u32::MAX)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub gid: String,
    pub name: String,
    pub count: u32,
}

/// Level-defined starting values restored by a restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDefaults {
    pub name: String,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub keys: u32,
    pub inventory: Inventory,
}

impl From<&PlayerConfig> for PlayerDefaults {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            name: config.name.clone(),
            hp: config.hp,
            atk: config.atk,
            def: config.def,
            keys: config.keys,
            inventory: Inventory::new(),
        }
    }
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

/// Facing plus the current step of the walk cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkCycle {
    pub facing: Direction,
    pub step: u32,
    frames: u32,
}

impl WalkCycle {
    pub fn new(frames: u32) -> Self {
        Self {
            facing: Direction::Down,
            step: 0,
            frames: frames.max(1),
        }
    }

    pub fn face(&mut self, direction: Direction) {
        self.facing = direction;
        if self.step >= self.frames {
            self.step = 0;
        }
    }

    pub fn advance(&mut self) {
        self.step = (self.step + 1) % self.frames;
    }

    pub fn reset(&mut self) {
        self.facing = Direction::Down;
        self.step = 0;
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Default for WalkCycle {
    fn default() -> Self {
        Self::new(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub position: Position,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    /// Generic keys (doors without an item requirement).
    pub keys: u32,
    pub inventory: Inventory,
    pub walk: WalkCycle,
}

impl PlayerState {
    pub fn new(defaults: &PlayerDefaults, spawn: Position, walk_frames: u32) -> Self {
        Self {
            name: defaults.name.clone(),
            position: spawn,
            hp: defaults.hp,
            atk: defaults.atk,
            def: defaults.def,
            keys: defaults.keys,
            inventory: defaults.inventory.clone(),
            walk: WalkCycle::new(walk_frames),
        }
    }

    /// Restores spawn position and every default, regardless of prior mutations.
    pub fn reset(&mut self, defaults: &PlayerDefaults, spawn: Position) {
        let frames = self.walk.frames();
        *self = Self::new(defaults, spawn, frames);
    }

    pub fn is_fallen(&self) -> bool {
        self.hp <= 0
    }

    pub fn add_keys(&mut self, amount: u32) {
        self.keys = self.keys.saturating_add(amount);
    }

    /// Spends `amount` keys; returns `false` without change when short.
    pub fn spend_keys(&mut self, amount: u32) -> bool {
        if self.keys < amount {
            return false;
        }
        self.keys -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consuming_last_unit_removes_entry() {
        let mut inventory = Inventory::new();
        inventory.add("badge", 1);
        assert!(inventory.consume("badge", 1));
        assert!(!inventory.contains("badge"));
        assert_eq!(inventory.count("badge"), 0);
    }

    #[test]
    fn short_consume_leaves_inventory_untouched() {
        let mut inventory = Inventory::new();
        inventory.add("badge", 2);
        assert!(!inventory.consume("badge", 3));
        assert_eq!(inventory.count("badge"), 2);
        assert!(!inventory.consume("missing", 1));
    }

    #[test]
    fn add_grants_at_least_one() {
        let mut inventory = Inventory::new();
        assert_eq!(inventory.add("gem", 0), 1);
        assert_eq!(inventory.add("gem", -4), 2);
        assert_eq!(inventory.add("gem", 5), 7);
    }

    #[test]
    fn entries_are_sorted_by_display_name() {
        let mut catalog = ItemCatalog::new();
        catalog.register("z", Some("Amulet"));
        let mut inventory = Inventory::new();
        inventory.add("a", 1);
        inventory.add("z", 2);
        let names: Vec<_> = inventory
            .entries(&catalog)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Amulet".to_string(), "a".to_string()]);
    }

    #[test]
    fn reset_restores_defaults_after_deep_mutation() {
        let defaults = PlayerDefaults::default();
        let spawn = Position::new(2, 3);
        let mut player = PlayerState::new(&defaults, spawn, 3);
        player.position = Position::new(9, 9);
        player.hp = -4;
        player.atk = 40;
        player.def = 12;
        player.keys = 7;
        player.inventory.add("badge", 3);
        player.walk.face(Direction::Left);
        player.walk.advance();

        player.reset(&defaults, spawn);

        assert_eq!(player, PlayerState::new(&defaults, spawn, 3));
    }

    #[test]
    fn walk_cycle_wraps() {
        let mut walk = WalkCycle::new(2);
        walk.advance();
        assert_eq!(walk.step, 1);
        walk.advance();
        assert_eq!(walk.step, 0);
    }
}
