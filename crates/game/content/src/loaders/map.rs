//! Tiled-style JSON map loader.
//!
//! A map carries tile layers (`ground`, `walls`, optional `items`, `doors`,
//! `monsters`, `objects_entity`) and object layers (`objects`, optional
//! `doors` and `items`). Tile layers provide walls, doors and the visual
//! marker sets; object layers provide the spawn point, encounter data, door
//! unlockers and story triggers.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use tower_core::{
    Cell, DoorInfo, GameConfig, ItemInfo, ItemKind, Level, LevelBuilder, MarkerLayer,
    MonsterStats, PlayerDefaults, Position, StairsDirection, StoryTrigger,
};

use crate::loaders::{LoadError, LoadResult, read_file};

const REQUIRED_TILE_LAYERS: [&str; 2] = ["ground", "walls"];
const SPAWN_OBJECT_LAYER: &str = "objects";
const OBJECT_LAYERS: [&str; 3] = ["objects", "doors", "items"];
const NAME_KEYS: [&str; 4] = ["displayName", "label", "name", "title"];

// ============================================================================
// Raw Tiled format
// ============================================================================

/// The subset of the Tiled JSON map format the loader understands.
#[derive(Clone, Debug, Deserialize)]
pub struct TiledMap {
    pub width: u32,
    pub height: u32,
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(default)]
    pub layers: Vec<TiledLayer>,
    #[serde(default)]
    pub tilesets: Vec<TiledTileset>,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum TiledLayer {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayer),
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayer),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TileLayer {
    pub name: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ObjectLayer {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<TiledObject>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TiledObject {
    #[serde(default)]
    pub name: String,
    /// `type` in older exports, `class` since Tiled 1.9.
    #[serde(default, alias = "class", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TiledTileset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tiles: Vec<TiledTile>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TiledTile {
    pub id: u32,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TiledProperty {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

// ============================================================================
// Property helpers
// ============================================================================

struct Props<'a>(&'a [TiledProperty]);

impl<'a> Props<'a> {
    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.0
            .iter()
            .find(|p| p.name == key)
            .map(|p| &p.value)
            .filter(|v| !v.is_null())
    }

    /// Non-empty trimmed string; numbers are stringified.
    fn string(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn int(&self, key: &str) -> Option<i32> {
        match self.raw(key)? {
            Value::Number(n) => n.as_f64().map(|f| f as i32),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i32),
            _ => None,
        }
    }

    /// `true` for a boolean `true` or the string `"true"` (any case).
    fn flag(&self, key: &str) -> bool {
        match self.raw(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn display_name(&self) -> Option<String> {
        NAME_KEYS.iter().find_map(|key| match self.raw(key) {
            Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            _ => None,
        })
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loader for Tiled JSON maps.
pub struct MapLoader;

impl MapLoader {
    /// Load a level from a JSON file; the file stem is the fallback level name.
    pub fn load(path: &Path, config: &GameConfig) -> LoadResult<Level> {
        let content = read_file(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Tower");
        Self::parse(&content, name, config)
    }

    pub fn parse(content: &str, default_name: &str, config: &GameConfig) -> LoadResult<Level> {
        let map: TiledMap = serde_json::from_str(content)?;
        Self::build(&map, default_name, config)
    }

    pub fn build(map: &TiledMap, default_name: &str, config: &GameConfig) -> LoadResult<Level> {
        if map.tile_width == 0 {
            return Err(LoadError::InvalidCellSize);
        }
        if map.tilesets.is_empty() {
            return Err(LoadError::MissingTileset);
        }
        for layer in REQUIRED_TILE_LAYERS {
            if tile_layer(map, layer).is_none() {
                return Err(LoadError::MissingTileLayer(layer));
            }
        }
        if object_layer(map, SPAWN_OBJECT_LAYER).is_none() {
            return Err(LoadError::MissingObjectLayer(SPAWN_OBJECT_LAYER));
        }

        let level_name = Props(&map.properties)
            .display_name()
            .unwrap_or_else(|| default_name.to_string());

        let mut builder = LevelBuilder::new(level_name, map.width, map.height);
        builder.player_defaults(PlayerDefaults::from(&config.player));
        seed_catalog(map, &mut builder);
        builder.walk_frames(walk_frames(map));

        for pos in occupied_cells(map, "walls")? {
            builder.set_cell(pos, Cell::Wall)?;
        }
        for pos in occupied_cells(map, "doors")? {
            if !matches!(builder.cell(pos), Some(Cell::Door(_))) {
                builder.set_cell(pos, Cell::Door(DoorInfo::with_key_cost(config.door_key_cost)))?;
            }
            builder.add_marker(MarkerLayer::Doors, pos)?;
        }
        for (layer, marker) in [
            ("items", MarkerLayer::Items),
            ("monsters", MarkerLayer::Monsters),
            ("objects_entity", MarkerLayer::Entities),
        ] {
            for pos in occupied_cells(map, layer)? {
                builder.add_marker(marker, pos)?;
            }
        }

        let mut reader = ObjectReader {
            builder,
            config,
            cell_size: f64::from(map.tile_width),
            door_objects: HashSet::new(),
            linked_doors: Vec::new(),
        };
        for layer_name in OBJECT_LAYERS {
            if let Some(layer) = object_layer(map, layer_name) {
                for object in &layer.objects {
                    reader.process(layer_name, object)?;
                }
            }
        }

        reader.free_tile_doors()?;

        let level = reader.builder.build()?;
        debug!(
            level = level.name(),
            width = level.width(),
            height = level.height(),
            "level loaded"
        );
        Ok(level)
    }
}

fn tile_layer<'a>(map: &'a TiledMap, name: &str) -> Option<&'a TileLayer> {
    map.layers.iter().find_map(|layer| match layer {
        TiledLayer::Tiles(tiles) if tiles.name == name => Some(tiles),
        _ => None,
    })
}

fn object_layer<'a>(map: &'a TiledMap, name: &str) -> Option<&'a ObjectLayer> {
    map.layers.iter().find_map(|layer| match layer {
        TiledLayer::Objects(objects) if objects.name == name => Some(objects),
        _ => None,
    })
}

/// Cells holding a non-empty tile in the named tile layer (none if absent).
fn occupied_cells(map: &TiledMap, name: &str) -> LoadResult<Vec<Position>> {
    let Some(layer) = tile_layer(map, name) else {
        return Ok(Vec::new());
    };
    if let Some(encoding) = layer.encoding.as_deref().filter(|e| *e != "csv") {
        return Err(LoadError::UnsupportedEncoding {
            layer: layer.name.clone(),
            encoding: encoding.to_string(),
        });
    }
    let data: Vec<u64> = match &layer.data {
        Some(value) => serde_json::from_value(value.clone())?,
        None => Vec::new(),
    };
    let expected = map.width as usize * map.height as usize;
    if data.len() != expected {
        return Err(LoadError::LayerSize {
            layer: layer.name.clone(),
            expected,
            actual: data.len(),
        });
    }

    let width = map.width as usize;
    Ok(data
        .iter()
        .enumerate()
        .filter(|(_, gid)| **gid != 0)
        .map(|(i, _)| Position::new((i % width) as i32, (i / width) as i32))
        .collect())
}

/// Registers tileset tiles carrying a `gid` property as inventory items.
fn seed_catalog(map: &TiledMap, builder: &mut LevelBuilder) {
    for tile in map.tilesets.iter().flat_map(|set| set.tiles.iter()) {
        let props = Props(&tile.properties);
        if let Some(gid) = props.string("gid") {
            let name = props.display_name();
            builder.catalog_mut().register(&gid, name.as_deref());
        }
    }
}

/// Longest per-direction frame sequence among `kind=player` tiles.
fn walk_frames(map: &TiledMap) -> u32 {
    let mut counts = std::collections::HashMap::<String, u32>::new();
    for tile in map.tilesets.iter().flat_map(|set| set.tiles.iter()) {
        let props = Props(&tile.properties);
        if props.string("kind").as_deref() != Some("player") {
            continue;
        }
        let dir = props.string("dir").unwrap_or_else(|| "down".to_string());
        *counts.entry(dir).or_default() += 1;
    }
    counts.values().copied().max().unwrap_or(1).max(1)
}

struct ObjectReader<'a> {
    builder: LevelBuilder,
    config: &'a GameConfig,
    cell_size: f64,
    /// Doors described by a `door` object rather than only a tile.
    door_objects: HashSet<Position>,
    linked_doors: Vec<Position>,
}

impl ObjectReader<'_> {
    /// A tile-only door opened by an unlocker costs no keys.
    fn free_tile_doors(&mut self) -> LoadResult<()> {
        for pos in std::mem::take(&mut self.linked_doors) {
            if self.door_objects.contains(&pos) {
                continue;
            }
            if let Some(Cell::Door(door)) = self.builder.cell(pos) {
                let door = DoorInfo {
                    key_cost: 0,
                    ..door.clone()
                };
                self.builder.set_cell(pos, Cell::Door(door))?;
                self.door_objects.insert(pos);
            }
        }
        Ok(())
    }

    fn cell_of(&self, object: &TiledObject) -> Position {
        let cell = self.cell_size;
        let width = if object.width > 0.0 { object.width } else { cell };
        let height = if object.height > 0.0 { object.height } else { cell };
        let (px, py) = if object.gid.is_some() {
            // Tile objects are anchored at their bottom-left corner.
            (object.x, object.y - height)
        } else {
            (object.x + width / 2.0, object.y + height / 2.0)
        };
        Position::new((px / cell).floor() as i32, (py / cell).floor() as i32)
    }

    fn process(&mut self, layer_name: &str, object: &TiledObject) -> LoadResult<()> {
        let pos = self.cell_of(object);
        if !self.builder.contains(pos) {
            debug!(layer = layer_name, %pos, "object outside the grid ignored");
            return Ok(());
        }

        let props = Props(&object.properties);
        let object_name = Some(object.name.trim().to_string()).filter(|n| !n.is_empty());
        let display_name = props.display_name().or_else(|| object_name.clone());
        let gid = object
            .gid
            .map(|g| g.to_string())
            .or_else(|| props.string("gid"));
        let kind = props
            .string("kind")
            .or_else(|| Some(object.kind.trim().to_string()).filter(|k| !k.is_empty()))
            .or(object_name)
            .unwrap_or_else(|| layer_name.to_string());

        if let Some(story_id) = props.string("story") {
            self.builder.add_story_trigger(
                pos,
                StoryTrigger {
                    story_id,
                    once: props.flag("once"),
                },
            )?;
        }

        match kind.as_str() {
            "player" => {
                self.builder.spawn(pos)?;
                let name = props
                    .string("charName")
                    .or(display_name)
                    .unwrap_or_else(|| self.config.player.name.clone());
                self.builder.player_name(name);
            }
            "door" => {
                let require = props.string("require");
                let require_name = require.as_ref().map(|gid| {
                    props
                        .string("requireName")
                        .unwrap_or_else(|| self.builder.catalog().display_name(Some(gid), None))
                });
                let key_cost = props
                    .int("keyCost")
                    .map(|c| c.max(0) as u32)
                    .unwrap_or(self.config.door_key_cost);
                let door = DoorInfo {
                    door_type: props
                        .string("doorType")
                        .unwrap_or_else(|| DoorInfo::DEFAULT_DOOR_TYPE.to_string()),
                    key_cost,
                    require,
                    require_name,
                    name: display_name,
                };
                self.builder.set_cell(pos, Cell::Door(door))?;
            }
            "key" => {
                let value = props.int("value").unwrap_or(self.config.items.key);
                let mut item = ItemInfo::new(ItemKind::Key).with_value(value);
                match gid {
                    Some(gid) => {
                        let name = self
                            .builder
                            .catalog()
                            .display_name(Some(&gid), display_name.as_deref());
                        item = item.with_gid(gid, Some(name));
                    }
                    None => item.name = display_name,
                }
                self.builder.set_cell(pos, Cell::Item(item))?;
            }
            "hp" | "atk" | "def" | "item" => {
                let item_kind = match kind.as_str() {
                    "item" => match props.string("itemType").as_deref() {
                        Some("atk") => ItemKind::Atk,
                        Some("def") => ItemKind::Def,
                        _ => ItemKind::Hp,
                    },
                    "atk" => ItemKind::Atk,
                    "def" => ItemKind::Def,
                    _ => ItemKind::Hp,
                };
                let value = props
                    .int("value")
                    .unwrap_or_else(|| item_kind.default_value(&self.config.items));
                let mut item = ItemInfo::new(item_kind).with_value(value);
                item.name = display_name;
                self.builder.set_cell(pos, Cell::Item(item))?;
            }
            "door_unlocker" => {
                let require = props.string("require");
                let require_name = require.as_ref().and_then(|_| props.string("requireName"));
                let linked = self
                    .builder
                    .link_unlocker(pos, require, require_name, display_name)?;
                self.linked_doors.extend(linked.map(|key| key.position()));
            }
            "stairs" => {
                let direction = props
                    .string("direction")
                    .and_then(|d| d.parse::<StairsDirection>().ok())
                    .unwrap_or_default();
                self.builder.set_cell(pos, Cell::Stairs(direction))?;
            }
            "monster" => {
                let defaults = self.config.monsters;
                let monster = MonsterStats {
                    name: props
                        .string("name")
                        .or(display_name)
                        .unwrap_or_else(|| "Monster".to_string()),
                    hp: props.int("hp").unwrap_or(defaults.hp),
                    atk: props.int("atk").unwrap_or(defaults.atk),
                    def: props.int("def").unwrap_or(defaults.def),
                };
                self.builder.set_cell(pos, Cell::Monster(monster))?;
            }
            other => {
                if props.raw("story").is_none() {
                    warn!(layer = layer_name, kind = other, %pos, "unknown object kind ignored");
                }
            }
        }
        Ok(())
    }
}
