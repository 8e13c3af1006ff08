//! Door, item, monster and stairs encounters resolved through the bus.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use common::{ScriptedBattles, builder, harness, harness_configured, harness_with};
use tower_core::{
    ALL_EQUIPMENT, Cell, Direction, DoorInfo, ItemInfo, ItemKind, Level, MarkerLayer,
    MonsterStats, PlayerDefaults, Position, StairsDirection,
};
use tower_runtime::{
    AttributeChanges, BattleError, BattleResult, BattleRewards, FloorError, FloorProgress,
    FloorSource, FormulaBattleProvider, InMemoryStorySource, InventoryReward, MonsterChanges,
};

const EAST: Position = Position::new(1, 0);

fn single_cell(cell: Cell) -> Level {
    let mut level = builder(3, 1);
    level.set_cell(EAST, cell).unwrap();
    level.build().unwrap()
}

fn with_keys(cell: Cell, keys: u32) -> Level {
    let mut level = builder(3, 1);
    level.set_cell(EAST, cell).unwrap();
    level.player_defaults(PlayerDefaults {
        keys,
        ..PlayerDefaults::default()
    });
    level.build().unwrap()
}

fn monster_level(monster: MonsterStats) -> Level {
    let mut level = builder(3, 1);
    level
        .set_cell(EAST, Cell::Monster(monster))
        .unwrap()
        .add_marker(MarkerLayer::Monsters, EAST)
        .unwrap();
    level.build().unwrap()
}

// ============================================================================
// Doors
// ============================================================================

#[tokio::test]
async fn item_door_consumes_required_item() {
    let door = DoorInfo::with_key_cost(1).requiring("badge", Some("Staff Badge".into()));
    let mut h = harness(single_cell(Cell::Door(door)));

    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(
        h.ui.last_message().as_deref(),
        Some("You need Staff Badge to open this door.")
    );

    assert!(h.game.debug_grant_item("badge", 1.0, Some("Staff Badge")));
    h.ui.take_messages();
    h.game.step(Direction::Right).await;

    assert_eq!(h.position(), EAST);
    assert_eq!(
        h.ui.messages(),
        vec!["You used Staff Badge to open the door.".to_string()]
    );
    let world = h.game.world();
    assert!(!world.player().inventory.contains("badge"));
    assert_eq!(world.level().cell(EAST), Some(&Cell::Floor));
    // Generic keys are untouched by an item door.
    assert_eq!(world.player().keys, 0);
}

#[tokio::test]
async fn key_door_refuses_when_short() {
    let mut h = harness(with_keys(Cell::Door(DoorInfo::with_key_cost(2)), 1));

    h.game.step(Direction::Right).await;

    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(h.game.world().player().keys, 1);
    assert!(h.game.world().level().door_at(EAST).is_some());
    assert_eq!(h.ui.last_message().as_deref(), Some("Need 2 key(s)."));
}

#[tokio::test]
async fn key_door_spends_keys_and_opens() {
    let mut h = harness(with_keys(Cell::Door(DoorInfo::with_key_cost(2)), 3));

    h.game.step(Direction::Right).await;

    assert_eq!(h.position(), EAST);
    assert_eq!(h.game.world().player().keys, 1);
    assert_eq!(
        h.ui.messages(),
        vec!["Used 2 key(s). The door opened.".to_string()]
    );
}

#[tokio::test]
async fn free_door_just_opens() {
    let mut h = harness(single_cell(Cell::Door(DoorInfo::with_key_cost(0))));

    h.game.step(Direction::Right).await;

    assert_eq!(h.position(), EAST);
    assert_eq!(h.ui.messages(), vec!["The door unlocks.".to_string()]);
}

/// Stepping on the proxy opens the neighbouring door it is linked to.
#[tokio::test]
async fn unlocker_opens_linked_door() {
    let proxy = EAST;
    let door = Position::new(1, 1);
    let mut level = builder(3, 2);
    level
        .set_cell(door, Cell::Door(DoorInfo::with_key_cost(1)))
        .unwrap()
        .add_marker(MarkerLayer::Doors, door)
        .unwrap()
        .add_marker(MarkerLayer::Entities, proxy)
        .unwrap();
    let linked = level
        .link_unlocker(proxy, Some("badge".into()), Some("Staff Badge".into()), None)
        .unwrap();
    assert_eq!(linked, Some(door.key()));
    let mut h = harness(level.build().unwrap());

    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(
        h.ui.last_message().as_deref(),
        Some("You need Staff Badge to open this door.")
    );

    h.game.debug_grant_item("badge", 1.0, Some("Staff Badge"));
    h.ui.take_messages();
    h.game.step(Direction::Right).await;

    assert_eq!(h.position(), proxy);
    assert_eq!(
        h.ui.messages(),
        vec!["You used Staff Badge to open the door.".to_string()]
    );
    let level = h.game.world().level();
    assert_eq!(level.cell(door), Some(&Cell::Floor));
    assert!(!level.has_marker(MarkerLayer::Doors, door));
    assert!(!level.has_marker(MarkerLayer::Entities, proxy));
    assert!(level.unlocker(proxy.key()).is_none());

    // The opened door is now plain floor.
    h.game.step(Direction::Down).await;
    assert_eq!(h.position(), door);
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
async fn stat_pickups_use_configured_defaults() {
    let mut level = builder(4, 1);
    level
        .set_cell(Position::new(1, 0), Cell::Item(ItemInfo::new(ItemKind::Hp)))
        .unwrap()
        .set_cell(Position::new(2, 0), Cell::Item(ItemInfo::new(ItemKind::Def)))
        .unwrap()
        .set_cell(
            Position::new(3, 0),
            Cell::Item(ItemInfo::new(ItemKind::Atk).with_value(7)),
        )
        .unwrap();
    let mut h = harness(level.build().unwrap());

    for _ in 0..3 {
        h.game.step(Direction::Right).await;
    }

    let player = h.game.world().player();
    assert_eq!(player.position, Position::new(3, 0));
    assert_eq!((player.hp, player.atk, player.def), (150, 17, 8));
    assert_eq!(h.ui.messages(), vec!["HP +50", "DEF +3", "ATK +7"]);
    assert_eq!(h.game.world().level().cell(Position::new(2, 0)), Some(&Cell::Floor));
}

#[tokio::test]
async fn stat_pickups_saturate_at_the_limit() {
    let mut level = builder(3, 1);
    level
        .set_cell(
            Position::new(1, 0),
            Cell::Item(ItemInfo::new(ItemKind::Hp).with_value(i32::MAX)),
        )
        .unwrap()
        .set_cell(
            Position::new(2, 0),
            Cell::Item(ItemInfo::new(ItemKind::Atk).with_value(i32::MAX)),
        )
        .unwrap();
    let mut h = harness(level.build().unwrap());

    h.game.step(Direction::Right).await;
    h.game.step(Direction::Right).await;

    let player = h.game.world().player();
    assert_eq!(player.position, Position::new(2, 0));
    assert_eq!((player.hp, player.atk), (i32::MAX, i32::MAX));
}

#[tokio::test]
async fn key_pickups_go_to_counter_or_inventory() {
    let mut level = builder(3, 1);
    level
        .set_cell(
            Position::new(1, 0),
            Cell::Item(ItemInfo::new(ItemKind::Key).with_value(2)),
        )
        .unwrap()
        .set_cell(
            Position::new(2, 0),
            Cell::Item(
                ItemInfo::new(ItemKind::Key).with_gid("badge", Some("Staff Badge".into())),
            ),
        )
        .unwrap()
        .add_marker(MarkerLayer::Items, Position::new(2, 0))
        .unwrap();
    let mut h = harness(level.build().unwrap());

    h.game.step(Direction::Right).await;
    h.game.step(Direction::Right).await;

    let world = h.game.world();
    assert_eq!(world.player().keys, 2);
    assert_eq!(world.player().inventory.count("badge"), 1);
    assert!(!world.level().has_marker(MarkerLayer::Items, Position::new(2, 0)));
    assert_eq!(
        h.ui.messages(),
        vec!["Picked up key x2.", "Obtained Staff Badge."]
    );
}

// ============================================================================
// Monsters
// ============================================================================

/// Damage accumulates on the stored monster until its hp runs out.
#[tokio::test]
async fn monster_damage_persists_between_encounters() {
    let chip = BattleResult::defeat().with_monster(MonsterChanges {
        delta_hp: Some(-5),
        ..MonsterChanges::default()
    });
    let battles = ScriptedBattles::new([Ok(Some(chip.clone())), Ok(Some(chip))]);
    let mut h = harness_with(
        monster_level(MonsterStats::new("Slime", 10, 1, 0)),
        battles.clone(),
        InMemoryStorySource::new(),
    );

    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(h.game.world().level().monster_at(EAST).map(|m| m.hp), Some(5));
    assert_eq!(h.ui.last_message().as_deref(), Some("Slime stands firm."));

    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), EAST);
    assert!(h.game.world().level().monster_at(EAST).is_none());
    assert!(!h.game.world().level().has_marker(MarkerLayer::Monsters, EAST));
    assert_eq!(h.ui.last_message().as_deref(), Some("You defeated Slime!"));

    let contexts = battles.contexts();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0].id, "battle-1-1,0");
    assert_eq!(contexts[1].monster.stats.hp, 5);
    assert_ne!(contexts[0].environment.seed, contexts[1].environment.seed);
}

/// An explicit `defeated: false` still lets the hp delta finish the monster.
#[tokio::test]
async fn undefeated_flag_with_lethal_delta_clears_monster() {
    let chip = BattleResult::victory().with_monster(MonsterChanges {
        defeated: Some(false),
        delta_hp: Some(-5),
        ..MonsterChanges::default()
    });
    let battles = ScriptedBattles::new([Ok(Some(chip.clone())), Ok(Some(chip))]);
    let mut h = harness_with(
        monster_level(MonsterStats::new("Slime", 10, 1, 0)),
        battles.clone(),
        InMemoryStorySource::new(),
    );

    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(h.game.world().level().monster_at(EAST).map(|m| m.hp), Some(5));
    assert!(h.game.world().level().has_marker(MarkerLayer::Monsters, EAST));

    h.game.step(Direction::Right).await;
    assert!(h.game.world().level().monster_at(EAST).is_none());
    assert_eq!(h.game.world().level().cell(EAST), Some(&Cell::Floor));
    assert!(!h.game.world().level().has_marker(MarkerLayer::Monsters, EAST));
    assert_eq!(battles.contexts()[1].monster.stats.hp, 5);
}

#[tokio::test]
async fn cancelled_or_failed_battles_leave_world_unchanged() {
    let battles = ScriptedBattles::new([
        Ok(None),
        Err(BattleError::TimedOut { after_ms: 10 }),
        Err(BattleError::LaunchFailed("no window".into())),
    ]);
    let mut h = harness_with(
        monster_level(MonsterStats::new("Slime", 10, 1, 0)),
        battles,
        InMemoryStorySource::new(),
    );

    for _ in 0..3 {
        h.game.step(Direction::Right).await;
    }

    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(h.game.world().player().hp, 100);
    assert_eq!(h.game.world().level().monster_at(EAST).map(|m| m.hp), Some(10));
    assert_eq!(
        h.ui.messages(),
        vec![
            "The battle was cancelled.",
            "The battle was cancelled.",
            "The battle could not be started.",
        ]
    );
}

#[tokio::test]
async fn battle_result_applies_player_changes_and_rewards() {
    let result = BattleResult::victory()
        .with_message("  Victory!  ")
        .with_player(AttributeChanges {
            delta_hp: Some(-7),
            atk: Some(12),
            ..AttributeChanges::default()
        })
        .with_rewards(BattleRewards {
            keys: Some(2.9),
            inventory: vec![InventoryReward {
                gid: "badge".into(),
                count: 1,
                name: Some("Staff Badge".into()),
            }],
            messages: vec![" Nice. ".into(), "   ".into()],
        });
    let battles = ScriptedBattles::new([Ok(Some(result))]);
    let mut h = harness_with(
        monster_level(MonsterStats::new("Slime", 10, 1, 0)),
        battles,
        InMemoryStorySource::new(),
    );

    h.game.step(Direction::Right).await;

    let world = h.game.world();
    assert_eq!(world.player().position, EAST);
    assert_eq!(world.player().hp, 93);
    assert_eq!(world.player().atk, 12);
    assert_eq!(world.player().keys, 2);
    assert_eq!(world.player().inventory.count("badge"), 1);
    assert_eq!(world.inventory_name(Some("badge"), None), "Staff Badge");
    assert_eq!(h.ui.messages(), vec!["Nice.", "Victory!"]);
}

#[tokio::test]
async fn defeat_grants_equipment_when_enabled() {
    let battles = ScriptedBattles::new([Ok(Some(BattleResult::victory()))]);
    let mut h = harness_configured(
        monster_level(MonsterStats::new("", 10, 1, 0)),
        battles,
        InMemoryStorySource::new(),
        |world| world.with_equipment_rewards(true),
    );

    h.game.step(Direction::Right).await;

    let inventory = &h.game.world().player().inventory;
    let granted: Vec<_> = ALL_EQUIPMENT
        .iter()
        .filter(|piece| inventory.count(piece.gid) == 1)
        .collect();
    assert_eq!(granted.len(), 1);
    assert_eq!(
        h.ui.messages(),
        vec![
            format!("Obtained {}.", granted[0].name),
            "You defeated the monster!".to_string(),
        ]
    );
}

/// Without a battle host the forecast decides.
#[tokio::test]
async fn formula_provider_resolves_fights() {
    let mut level = builder(3, 1);
    level
        .set_cell(EAST, Cell::Monster(MonsterStats::new("Slime", 20, 8, 2)))
        .unwrap();
    let mut h = harness_with(
        level.build().unwrap(),
        Arc::new(FormulaBattleProvider),
        InMemoryStorySource::new(),
    );

    h.game.step(Direction::Right).await;

    // 3 rounds at 8 damage, the slime strikes twice for 3.
    assert_eq!(h.position(), EAST);
    assert_eq!(h.game.world().player().hp, 94);

    let mut h = harness(monster_level(MonsterStats::new("Golem", 20, 5, 10)));
    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(h.ui.last_message().as_deref(), Some("Golem stands firm."));
}

// ============================================================================
// Stairs and floors
// ============================================================================

#[tokio::test]
async fn stairs_complete_the_level_by_default() {
    let mut h = harness(single_cell(Cell::Stairs(StairsDirection::Up)));

    h.game.step(Direction::Right).await;

    assert_eq!(h.position(), EAST);
    assert_eq!(h.ui.messages(), vec!["Lobby complete!".to_string()]);
}

/// Every floor: spawn, down stairs, floor, up stairs.
fn floor_layout() -> Level {
    let mut level = builder(4, 1);
    level
        .set_cell(Position::new(1, 0), Cell::Stairs(StairsDirection::Down))
        .unwrap()
        .set_cell(Position::new(3, 0), Cell::Stairs(StairsDirection::Up))
        .unwrap();
    level.build().unwrap()
}

#[derive(Default)]
struct CountingFloors {
    loads: AtomicUsize,
}

#[async_trait]
impl FloorSource for CountingFloors {
    async fn load_floor(&self, floor: u32) -> Result<Level, FloorError> {
        if floor > 3 {
            return Err(FloorError::Missing(floor));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(floor_layout())
    }
}

#[tokio::test]
async fn floors_load_once_and_restore_snapshots() {
    let floors = Arc::new(CountingFloors::default());
    let source = floors.clone();
    let mut h = harness_configured(
        floor_layout(),
        Arc::new(FormulaBattleProvider),
        InMemoryStorySource::new(),
        |world| world.with_floors(FloorProgress::new(source)),
    );
    assert_eq!(h.game.world().level().name(), "Floor 1");

    // Down from the first floor leads nowhere.
    h.game.step(Direction::Right).await;
    assert_eq!(h.position(), Position::new(1, 0));
    assert_eq!(h.ui.last_message().as_deref(), Some("Floor 1 complete!"));

    h.game.step(Direction::Right).await;
    h.game.step(Direction::Right).await;
    assert_eq!(h.game.world().current_floor(), Some(2));
    assert_eq!(h.game.world().level().name(), "Floor 2");
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(h.ui.last_message().as_deref(), Some("Entered Floor 2."));
    assert_eq!(floors.loads.load(Ordering::SeqCst), 1);

    // Back down: the player returns to where they left floor 1.
    h.game.step(Direction::Right).await;
    assert_eq!(h.game.world().current_floor(), Some(1));
    assert_eq!(h.position(), Position::new(2, 0));

    h.game.step(Direction::Right).await;
    assert_eq!(h.game.world().current_floor(), Some(2));
    assert_eq!(h.position(), Position::ORIGIN);
    assert_eq!(floors.loads.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.ui.level_names(),
        vec!["Floor 1", "Floor 2", "Floor 1", "Floor 2"]
    );
}
