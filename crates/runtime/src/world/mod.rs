//! The mutable game world of one running session.
//!
//! [`TowerWorld`] owns the active level, the single player state and every
//! collaborator the encounter handlers talk to. It is only touched from bus
//! handlers and from the input entry point, never from two places at once.

mod floors;

pub use floors::{
    DirectoryFloorSource, FloorError, FloorProgress, FloorSource, StairsBehaviour, floor_name,
};

use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use tower_core::{
    EquipmentDefinition, GameConfig, InventoryEntry, Level, MonsterStats, PlayerState, Position,
    StairsDirection, StoryNodeEvent, pick_equipment_reward,
};

use crate::api::BattleProvider;
use crate::battle::{
    BattleContext, BattleEnvironment, BattleError, BattleMonster, BattlePlayer, BattleResult,
    CombatStats, MiniGameRegistry,
};
use crate::events::{EventQueue, GameEvent, MoveBlockReason, Trigger};
use crate::journal::Journal;
use crate::story::{GrantOutcome, StoryCallbacks};
use crate::ui::UiHooks;

use floors::FloorSnapshot;

/// The pending movement used as the source of resolver-issued commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAttempt {
    pub from: Position,
    pub to: Position,
}

pub struct TowerWorld {
    level: Level,
    player: PlayerState,
    last_move: Option<MoveAttempt>,
    config: GameConfig,
    events: EventQueue,
    ui: Arc<dyn UiHooks>,
    journal: Journal,
    battles: Arc<dyn BattleProvider>,
    mini_games: MiniGameRegistry,
    battle_count: u64,
    rng: ChaCha8Rng,
    equipment_rewards: bool,
    stairs: StairsBehaviour,
    floors: Option<FloorProgress>,
}

impl TowerWorld {
    pub fn new(
        level: Level,
        config: GameConfig,
        events: EventQueue,
        ui: Arc<dyn UiHooks>,
        battles: Arc<dyn BattleProvider>,
    ) -> Self {
        let player = PlayerState::new(level.player_defaults(), level.spawn(), level.walk_frames());
        Self {
            level,
            player,
            last_move: None,
            config,
            events,
            ui,
            journal: Journal::new(),
            battles,
            mini_games: MiniGameRegistry::new(),
            battle_count: 0,
            rng: ChaCha8Rng::seed_from_u64(0),
            equipment_rewards: false,
            stairs: StairsBehaviour::CompleteLevel,
            floors: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_mini_games(mut self, registry: MiniGameRegistry) -> Self {
        self.mini_games = registry;
        self
    }

    pub fn with_equipment_rewards(mut self, enabled: bool) -> Self {
        self.equipment_rewards = enabled;
        self
    }

    /// Enables floor progression; the current level becomes floor `progress.current()`.
    pub fn with_floors(mut self, progress: FloorProgress) -> Self {
        self.stairs = StairsBehaviour::Floors;
        self.level.set_name(floor_name(progress.current()));
        self.floors = Some(progress);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn mini_games_mut(&mut self) -> &mut MiniGameRegistry {
        &mut self.mini_games
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn stairs_behaviour(&self) -> StairsBehaviour {
        self.stairs
    }

    pub fn current_floor(&self) -> Option<u32> {
        self.floors.as_ref().map(FloorProgress::current)
    }

    pub fn equipment_rewards(&self) -> bool {
        self.equipment_rewards
    }

    // ========================================================================
    // UI
    // ========================================================================

    pub fn post_message(&self, message: &str) {
        self.ui.post_message(message);
    }

    pub fn update_ui(&self) {
        self.ui.update_stats(&self.player);
    }

    /// Pushes the level name and posts the entry message.
    pub fn announce_level(&self) {
        self.update_ui();
        self.ui.update_level_name(self.level.name());
        self.post_message(&format!("Entered {}.", self.level.name()));
    }

    // ========================================================================
    // Move bookkeeping
    // ========================================================================

    pub fn last_move(&self) -> Option<MoveAttempt> {
        self.last_move
    }

    pub fn set_last_move(&mut self, attempt: MoveAttempt) {
        self.last_move = Some(attempt);
    }

    pub fn clear_last_move(&mut self) {
        self.last_move = None;
    }

    /// Source of a resolver-issued commit: the pending attempt, else the player.
    pub fn fallback_from(&self) -> Position {
        self.last_move
            .map(|attempt| attempt.from)
            .unwrap_or(self.player.position)
    }

    pub fn enqueue(&self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn enqueue_commit(&self, to: Position, advance_frame: bool) {
        self.enqueue(GameEvent::move_commit(self.fallback_from(), to, advance_frame));
    }

    pub fn enqueue_blocked(&self, reason: MoveBlockReason, position: Position, message: &str) {
        self.enqueue(GameEvent::move_blocked(
            reason,
            position,
            Some(message.to_string()),
        ));
    }

    /// The single place the player's position changes.
    pub fn commit_move(&mut self, to: Position, advance_frame: bool) {
        if advance_frame {
            self.player.walk.advance();
        }
        self.player.position = to;
        if self.player.is_fallen() {
            self.post_message("You fell... click \"Restart\".");
        }
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Adds at least one unit of `gid`, registering `name` in the catalog.
    pub fn add_item(&mut self, gid: &str, quantity: i64, name: Option<&str>) {
        if gid.is_empty() {
            return;
        }
        self.level.catalog_mut().register(gid, name);
        self.player.inventory.add(gid, quantity);
    }

    pub fn consume_item(&mut self, gid: &str, quantity: i64) -> bool {
        !gid.is_empty() && self.player.inventory.consume(gid, quantity)
    }

    pub fn inventory_name(&self, gid: Option<&str>, fallback: Option<&str>) -> String {
        self.level.catalog().display_name(gid, fallback)
    }

    pub fn inventory_entries(&self) -> Vec<InventoryEntry> {
        self.player.inventory.entries(self.level.catalog())
    }

    pub fn apply_key_pickup(&mut self, amount: u32) {
        self.player.add_keys(amount);
        self.update_ui();
    }

    /// Grants a story reward, honouring an optional cap on the held count.
    pub fn grant_story_item(&mut self, gid: &str, amount: i64, max: Option<i64>) -> GrantOutcome {
        let gid = gid.trim();
        if gid.is_empty() {
            return GrantOutcome {
                success: false,
                granted: 0,
                current: 0,
            };
        }
        let current = self.player.inventory.count(gid);
        let amount = if amount > 0 { amount } else { 1 };

        let to_grant = match max {
            Some(limit) => {
                if limit <= 0 || i64::from(current) >= limit {
                    return GrantOutcome {
                        success: false,
                        granted: 0,
                        current,
                    };
                }
                amount.min(limit - i64::from(current))
            }
            None => amount,
        };

        self.add_item(gid, to_grant, None);
        self.update_ui();
        GrantOutcome {
            success: true,
            granted: u32::try_from(to_grant).unwrap_or(u32::MAX),
            current: self.player.inventory.count(gid),
        }
    }

    // ========================================================================
    // Restart and debug tools
    // ========================================================================

    /// Restores the level-defined defaults at the spawn cell.
    pub fn reset_player_state(&mut self) {
        self.player
            .reset(self.level.player_defaults(), self.level.spawn());
        self.last_move = None;
        self.update_ui();
        self.post_message("Reset to the spawn point.");
    }

    /// Overwrites hp/atk/def; values are floored and clamped at zero.
    pub fn debug_set_attributes(&mut self, hp: Option<f64>, atk: Option<f64>, def: Option<f64>) {
        let player = &mut self.player;
        player.hp = clamp_stat(hp, player.hp);
        player.atk = clamp_stat(atk, player.atk);
        player.def = clamp_stat(def, player.def);
        self.update_ui();
        self.post_message("Debug: Player attributes updated.");
    }

    /// Grants `count` of `gid`. Unknown gids need a name.
    pub fn debug_grant_item(&mut self, gid: &str, count: f64, name: Option<&str>) -> bool {
        let gid = gid.trim();
        if gid.is_empty() || !count.is_finite() || count.floor() <= 0.0 {
            return false;
        }
        let amount = count.floor() as i64;
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if !self.level.catalog().contains(gid) && name.is_none() {
            self.post_message(&format!("Debug Error: item not found with gid {gid}"));
            return false;
        }
        self.add_item(gid, amount, name);
        let item_name = self.inventory_name(Some(gid), name);
        let quantity = if amount > 1 {
            format!(" x{amount}")
        } else {
            String::new()
        };
        self.post_message(&format!("Debug: Granted {item_name}{quantity}."));
        self.update_ui();
        true
    }

    // ========================================================================
    // Journal
    // ========================================================================

    pub fn unlock_article(&mut self, id: &str) -> bool {
        let unlocked = self.journal.unlock(id);
        if unlocked {
            info!(article = id.trim(), "article unlocked");
        }
        unlocked
    }

    // ========================================================================
    // Battles
    // ========================================================================

    /// Snapshot handed to the battle provider; consumes one seed from the RNG.
    pub fn battle_context(&mut self, position: Position, monster: &MonsterStats) -> BattleContext {
        self.battle_count += 1;
        let key = position.key();
        BattleContext {
            id: format!("battle-{}-{key}", self.battle_count),
            level_name: self.level.name().to_string(),
            player: BattlePlayer {
                name: self.player.name.clone(),
                stats: CombatStats {
                    hp: self.player.hp,
                    atk: self.player.atk,
                    def: self.player.def,
                },
                inventory: self.player.inventory.clone(),
                keys: self.player.keys,
            },
            monster: BattleMonster {
                id: key,
                name: monster.name.clone(),
                stats: CombatStats {
                    hp: monster.hp,
                    atk: monster.atk,
                    def: monster.def,
                },
                mini_game_id: self.mini_games.select_id(None),
            },
            environment: BattleEnvironment {
                position,
                seed: self.rng.next_u64(),
                extra: None,
            },
        }
    }

    pub fn battle_provider(&self) -> Arc<dyn BattleProvider> {
        Arc::clone(&self.battles)
    }

    pub async fn run_battle(
        &self,
        context: BattleContext,
    ) -> Result<Option<BattleResult>, BattleError> {
        self.battle_provider().run_battle(context).await
    }

    pub fn roll_equipment(&mut self) -> &'static EquipmentDefinition {
        pick_equipment_reward(&mut self.rng)
    }

    // ========================================================================
    // Floors
    // ========================================================================

    /// Moves to the floor the stairs lead to.
    ///
    /// Returns `false` (and changes nothing) when floors are disabled, the
    /// stairs lead nowhere, or the floor cannot be loaded.
    pub async fn change_floor(&mut self, direction: StairsDirection) -> bool {
        let Some(progress) = self.floors.as_mut() else {
            return false;
        };
        let Some(target) = progress.target(direction) else {
            return false;
        };

        let (mut level, position) = match progress.take_snapshot(target) {
            Some(snapshot) => (snapshot.level, snapshot.position),
            None => {
                let source = progress.source();
                match source.load_floor(target).await {
                    Ok(level) => {
                        let spawn = level.spawn();
                        (level, spawn)
                    }
                    Err(err) => {
                        warn!(floor = target, error = %err, "failed to load floor");
                        return false;
                    }
                }
            }
        };

        level.set_name(floor_name(target));
        level.catalog_mut().merge(self.level.catalog());
        let previous = std::mem::replace(&mut self.level, level);
        let snapshot = FloorSnapshot {
            level: previous,
            position: self.player.position,
        };
        if let Some(progress) = self.floors.as_mut() {
            progress.leave(snapshot, target);
        }

        self.player.position = position;
        self.last_move = None;
        debug!(floor = target, "floor changed");
        self.announce_level();
        true
    }
}

fn clamp_stat(value: Option<f64>, current: i32) -> i32 {
    match value {
        Some(v) if v.is_finite() => (v.floor() as i32).max(0),
        _ => current,
    }
}

impl StoryCallbacks for TowerWorld {
    fn on_start(&mut self) {
        self.last_move = None;
    }

    fn on_end(&mut self) {
        self.last_move = None;
    }

    fn grant_item(&mut self, gid: &str, amount: i64, max: Option<i64>) -> Option<GrantOutcome> {
        Some(self.grant_story_item(gid, amount, max))
    }

    fn inventory_name(&self, gid: &str) -> String {
        TowerWorld::inventory_name(self, Some(gid), None)
    }

    /// Node events are enqueued as custom events with an object payload.
    fn emit_event(&mut self, event: &StoryNodeEvent) {
        let kind = event.kind.trim();
        if kind.is_empty() {
            return;
        }
        let payload = match &event.payload {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Default::default()),
        };
        self.enqueue(GameEvent::custom(Trigger::System, kind, payload));
    }
}
