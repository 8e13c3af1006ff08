//! The mutable world of one loaded level.
//!
//! A [`Level`] owns the cell grid plus the side-tables that are not encounter
//! data: door-unlocker links, story triggers and the visual marker layers.
//! It is assembled once by a [`LevelBuilder`] (which enforces bounds and the
//! spawn requirement) and afterwards mutated in place as encounters resolve.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::catalog::ItemCatalog;
use super::cell::{Cell, DoorInfo, ItemInfo, MonsterStats, TileType};
use super::common::{Position, TileKey};
use super::error::LevelError;
use super::player::PlayerDefaults;

/// A proxy cell that resolves a different (linked) door when stepped on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorUnlocker {
    /// Linked door cell, found among the four orthogonal neighbours at load.
    pub door: Option<TileKey>,
    pub require: Option<String>,
    pub require_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryTrigger {
    pub story_id: String,
    /// Removed (with its entity marker) after the first successful start.
    pub once: bool,
}

/// Visual layers that only track presence per cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MarkerLayer {
    Items,
    Doors,
    Monsters,
    /// Entity-layer obstructions (`objects_entity`).
    Entities,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Markers {
    items: BTreeSet<TileKey>,
    doors: BTreeSet<TileKey>,
    monsters: BTreeSet<TileKey>,
    entities: BTreeSet<TileKey>,
}

impl Markers {
    fn layer(&self, layer: MarkerLayer) -> &BTreeSet<TileKey> {
        match layer {
            MarkerLayer::Items => &self.items,
            MarkerLayer::Doors => &self.doors,
            MarkerLayer::Monsters => &self.monsters,
            MarkerLayer::Entities => &self.entities,
        }
    }

    fn layer_mut(&mut self, layer: MarkerLayer) -> &mut BTreeSet<TileKey> {
        match layer {
            MarkerLayer::Items => &mut self.items,
            MarkerLayer::Doors => &mut self.doors,
            MarkerLayer::Monsters => &mut self.monsters,
            MarkerLayer::Entities => &mut self.entities,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    name: String,
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    unlockers: BTreeMap<TileKey, DoorUnlocker>,
    story_triggers: BTreeMap<TileKey, StoryTrigger>,
    markers: Markers,
    spawn: Position,
    player_defaults: PlayerDefaults,
    catalog: ItemCatalog,
    walk_frames: u32,
}

impl Level {
    pub fn builder(name: impl Into<String>, width: u32, height: u32) -> LevelBuilder {
        LevelBuilder::new(name, width, height)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        index_of(self.width, self.height, position).is_some()
    }

    pub fn cell(&self, position: Position) -> Option<&Cell> {
        index_of(self.width, self.height, position).map(|i| &self.cells[i])
    }

    pub fn tile_type(&self, position: Position) -> Option<TileType> {
        self.cell(position).map(Cell::tile_type)
    }

    /// Replaces the cell at `position` with floor and returns what was there.
    pub fn clear_cell(&mut self, position: Position) -> Option<Cell> {
        let index = index_of(self.width, self.height, position)?;
        Some(std::mem::take(&mut self.cells[index]))
    }

    pub fn door_at(&self, position: Position) -> Option<&DoorInfo> {
        self.cell(position).and_then(Cell::door)
    }

    pub fn item_at(&self, position: Position) -> Option<&ItemInfo> {
        self.cell(position).and_then(Cell::item)
    }

    pub fn monster_at(&self, position: Position) -> Option<&MonsterStats> {
        self.cell(position).and_then(Cell::monster)
    }

    pub fn monster_at_mut(&mut self, position: Position) -> Option<&mut MonsterStats> {
        let index = index_of(self.width, self.height, position)?;
        match &mut self.cells[index] {
            Cell::Monster(monster) => Some(monster),
            _ => None,
        }
    }

    /// Opens the door at `position`.
    ///
    /// The cell reverts to floor, the door and entity markers are removed and
    /// every unlocker linked to this door is dropped. Returns `None` (and
    /// changes nothing) when the cell is not a door.
    pub fn open_door(&mut self, position: Position) -> Option<DoorInfo> {
        if self.door_at(position).is_none() {
            return None;
        }
        let door = match self.clear_cell(position) {
            Some(Cell::Door(door)) => door,
            _ => return None,
        };
        self.remove_marker(MarkerLayer::Doors, position);
        self.remove_marker(MarkerLayer::Entities, position);
        self.remove_unlockers_for_door(position.key());
        Some(door)
    }

    pub fn unlocker(&self, key: TileKey) -> Option<&DoorUnlocker> {
        self.unlockers.get(&key)
    }

    pub fn unlockers(&self) -> impl Iterator<Item = (TileKey, &DoorUnlocker)> {
        self.unlockers.iter().map(|(key, unlocker)| (*key, unlocker))
    }

    pub fn remove_unlocker(&mut self, key: TileKey) -> Option<DoorUnlocker> {
        self.unlockers.remove(&key)
    }

    /// Drops every unlocker linked to `door`; returns how many were removed.
    pub fn remove_unlockers_for_door(&mut self, door: TileKey) -> usize {
        let before = self.unlockers.len();
        self.unlockers.retain(|_, unlocker| unlocker.door != Some(door));
        before - self.unlockers.len()
    }

    pub fn story_trigger(&self, key: TileKey) -> Option<&StoryTrigger> {
        self.story_triggers.get(&key)
    }

    pub fn remove_story_trigger(&mut self, key: TileKey) -> Option<StoryTrigger> {
        self.story_triggers.remove(&key)
    }

    pub fn has_marker(&self, layer: MarkerLayer, position: Position) -> bool {
        self.markers.layer(layer).contains(&position.key())
    }

    pub fn remove_marker(&mut self, layer: MarkerLayer, position: Position) -> bool {
        self.markers.layer_mut(layer).remove(&position.key())
    }

    /// An entity-layer obstruction sits on this cell.
    pub fn has_blocking_object(&self, position: Position) -> bool {
        self.has_marker(MarkerLayer::Entities, position)
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    pub fn player_defaults(&self) -> &PlayerDefaults {
        &self.player_defaults
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ItemCatalog {
        &mut self.catalog
    }

    pub fn walk_frames(&self) -> u32 {
        self.walk_frames
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, &Cell)> {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let x = (i % width) as i32;
            let y = (i / width) as i32;
            (Position::new(x, y), cell)
        })
    }
}

fn index_of(width: u32, height: u32, position: Position) -> Option<usize> {
    if position.x < 0 || position.y < 0 {
        return None;
    }
    let (x, y) = (position.x as u32, position.y as u32);
    if x >= width || y >= height {
        return None;
    }
    Some(y as usize * width as usize + x as usize)
}

/// Assembles a [`Level`] from a normalised map source.
#[derive(Clone, Debug)]
pub struct LevelBuilder {
    name: String,
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    unlockers: BTreeMap<TileKey, DoorUnlocker>,
    story_triggers: BTreeMap<TileKey, StoryTrigger>,
    markers: Markers,
    spawn: Option<Position>,
    player_defaults: PlayerDefaults,
    catalog: ItemCatalog,
    walk_frames: u32,
}

impl LevelBuilder {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            cells: vec![Cell::Floor; width as usize * height as usize],
            unlockers: BTreeMap::new(),
            story_triggers: BTreeMap::new(),
            markers: Markers::default(),
            spawn: None,
            player_defaults: PlayerDefaults::default(),
            catalog: ItemCatalog::new(),
            walk_frames: 1,
        }
    }

    fn check(&self, position: Position) -> Result<usize, LevelError> {
        index_of(self.width, self.height, position).ok_or(LevelError::OutOfBounds {
            position,
            width: self.width,
            height: self.height,
        })
    }

    pub fn contains(&self, position: Position) -> bool {
        index_of(self.width, self.height, position).is_some()
    }

    pub fn cell(&self, position: Position) -> Option<&Cell> {
        index_of(self.width, self.height, position).map(|i| &self.cells[i])
    }

    pub fn set_cell(&mut self, position: Position, cell: Cell) -> Result<&mut Self, LevelError> {
        let index = self.check(position)?;
        self.cells[index] = cell;
        Ok(self)
    }

    pub fn add_marker(
        &mut self,
        layer: MarkerLayer,
        position: Position,
    ) -> Result<&mut Self, LevelError> {
        self.check(position)?;
        self.markers.layer_mut(layer).insert(position.key());
        Ok(self)
    }

    pub fn add_story_trigger(
        &mut self,
        position: Position,
        trigger: StoryTrigger,
    ) -> Result<&mut Self, LevelError> {
        self.check(position)?;
        self.story_triggers.insert(position.key(), trigger);
        Ok(self)
    }

    pub fn spawn(&mut self, position: Position) -> Result<&mut Self, LevelError> {
        self.check(position)?;
        self.spawn = Some(position);
        Ok(self)
    }

    pub fn player_defaults(&mut self, defaults: PlayerDefaults) -> &mut Self {
        self.player_defaults = defaults;
        self
    }

    pub fn player_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.player_defaults.name = name.into();
        self
    }

    pub fn walk_frames(&mut self, frames: u32) -> &mut Self {
        self.walk_frames = frames.max(1);
        self
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ItemCatalog {
        &mut self.catalog
    }

    /// Registers a door-unlocker proxy at `position`.
    ///
    /// The first orthogonal neighbour holding a door becomes the linked door;
    /// the unlocker's requirement overrides the door's own, and the door
    /// inherits the unlocker's name when it has none. Returns the linked door.
    pub fn link_unlocker(
        &mut self,
        position: Position,
        require: Option<String>,
        require_name: Option<String>,
        name: Option<String>,
    ) -> Result<Option<TileKey>, LevelError> {
        self.check(position)?;

        let linked = position
            .neighbors()
            .into_iter()
            .find(|n| matches!(self.cell(*n), Some(Cell::Door(_))));

        let mut door_require_name = None;
        if let Some(door_pos) = linked {
            let index = self.check(door_pos)?;
            if let Cell::Door(door) = &mut self.cells[index] {
                if require.is_some() {
                    door.require = require.clone();
                }
                if require_name.is_some() {
                    door.require_name = require_name.clone();
                }
                if door.name.is_none() {
                    door.name = name.clone();
                }
                door_require_name = door.require_name.clone();
            }
        }

        let resolved_name = require_name.or(door_require_name).or_else(|| {
            require
                .as_deref()
                .map(|gid| self.catalog.display_name(Some(gid), None))
        });

        let door = linked.map(Position::key);
        self.unlockers.insert(
            position.key(),
            DoorUnlocker {
                door,
                require,
                require_name: resolved_name,
                name,
            },
        );
        Ok(door)
    }

    pub fn build(self) -> Result<Level, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        let spawn = self.spawn.ok_or(LevelError::MissingSpawn)?;
        let mut markers = self.markers;
        markers.entities.remove(&spawn.key());

        Ok(Level {
            name: self.name,
            width: self.width,
            height: self.height,
            cells: self.cells,
            unlockers: self.unlockers,
            story_triggers: self.story_triggers,
            markers,
            spawn,
            player_defaults: self.player_defaults,
            catalog: self.catalog,
            walk_frames: self.walk_frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::cell::{ItemKind, ItemInfo};

    fn corridor() -> LevelBuilder {
        let mut builder = LevelBuilder::new("Test", 5, 3);
        builder.spawn(Position::new(0, 1)).unwrap();
        builder
    }

    #[test]
    fn build_requires_spawn() {
        let builder = LevelBuilder::new("Test", 3, 3);
        assert_eq!(builder.build().unwrap_err(), LevelError::MissingSpawn);
    }

    #[test]
    fn placement_outside_grid_is_rejected() {
        let mut builder = corridor();
        let err = builder
            .set_cell(Position::new(5, 0), Cell::Wall)
            .unwrap_err();
        assert!(matches!(err, LevelError::OutOfBounds { .. }));
    }

    #[test]
    fn spawn_entity_marker_is_removed_on_build() {
        let mut builder = corridor();
        builder
            .add_marker(MarkerLayer::Entities, Position::new(0, 1))
            .unwrap();
        builder
            .add_marker(MarkerLayer::Entities, Position::new(1, 1))
            .unwrap();
        let level = builder.build().unwrap();
        assert!(!level.has_blocking_object(Position::new(0, 1)));
        assert!(level.has_blocking_object(Position::new(1, 1)));
    }

    #[test]
    fn unlocker_links_adjacent_door_and_overrides_requirement() {
        let mut builder = corridor();
        builder
            .set_cell(Position::new(3, 1), Cell::Door(DoorInfo::with_key_cost(1)))
            .unwrap();
        let linked = builder
            .link_unlocker(
                Position::new(2, 1),
                Some("badge".into()),
                Some("Badge".into()),
                Some("Lever".into()),
            )
            .unwrap();
        assert_eq!(linked, Some(TileKey::new(3, 1)));

        let level = builder.build().unwrap();
        let door = level.door_at(Position::new(3, 1)).unwrap();
        assert_eq!(door.require.as_deref(), Some("badge"));
        assert_eq!(door.require_name.as_deref(), Some("Badge"));
        assert_eq!(door.name.as_deref(), Some("Lever"));
        let unlocker = level.unlocker(TileKey::new(2, 1)).unwrap();
        assert_eq!(unlocker.door, Some(TileKey::new(3, 1)));
    }

    #[test]
    fn unlocker_without_adjacent_door_has_no_link() {
        let mut builder = corridor();
        let linked = builder
            .link_unlocker(Position::new(2, 1), None, None, None)
            .unwrap();
        assert_eq!(linked, None);
        let level = builder.build().unwrap();
        assert_eq!(level.unlocker(TileKey::new(2, 1)).unwrap().door, None);
    }

    #[test]
    fn opening_door_clears_cell_markers_and_linked_unlockers() {
        let mut builder = corridor();
        let door = Position::new(3, 1);
        builder
            .set_cell(door, Cell::Door(DoorInfo::with_key_cost(1)))
            .unwrap();
        builder.add_marker(MarkerLayer::Doors, door).unwrap();
        builder.link_unlocker(Position::new(2, 1), None, None, None).unwrap();
        builder.link_unlocker(Position::new(4, 1), None, None, None).unwrap();
        let mut level = builder.build().unwrap();

        assert!(level.open_door(door).is_some());
        assert_eq!(level.tile_type(door), Some(TileType::Floor));
        assert!(!level.has_marker(MarkerLayer::Doors, door));
        assert_eq!(level.unlockers().count(), 0);
        assert!(level.open_door(door).is_none());
    }

    #[test]
    fn clear_cell_returns_previous_content() {
        let mut builder = corridor();
        let pos = Position::new(1, 1);
        builder
            .set_cell(pos, Cell::Item(ItemInfo::new(ItemKind::Key)))
            .unwrap();
        let mut level = builder.build().unwrap();
        assert!(matches!(level.clear_cell(pos), Some(Cell::Item(_))));
        assert!(level.cell(pos).unwrap().is_floor());
        assert!(level.clear_cell(Position::new(-1, 0)).is_none());
    }
}
