//! Monster encounters, adjudicated by the battle provider.

use async_trait::async_trait;
use tracing::{debug, warn};

use tower_core::{GameError, MarkerLayer, PlayerState, Position};

use crate::battle::{AttributeChanges, BattleError, BattleRewards};
use crate::context::TowerContext;
use crate::events::{EventHandler, EventPayload, GameEvent, HandlerError, MoveBlockReason};
use crate::world::TowerWorld;

/// Hands the fight to the battle provider and applies its result.
///
/// The world is untouched while the battle is pending. A provider failure, a
/// timeout or a cancelled battle blocks the move and leaves the monster in
/// place.
#[derive(Debug, Clone, Copy)]
pub struct MonsterEncounterHandler;

#[async_trait]
impl EventHandler<TowerContext> for MonsterEncounterHandler {
    fn name(&self) -> &'static str {
        "monster_encounter"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::MonsterEncounter { position } = event.payload else {
            return Ok(());
        };
        let world = &mut ctx.world;

        let Some(monster) = world.level().monster_at(position).cloned() else {
            clear_monster(world, position);
            world.enqueue_commit(position, true);
            return Ok(());
        };

        let context = world.battle_context(position, &monster);
        let result = match world.run_battle(context).await {
            Ok(Some(result)) => result,
            Ok(None) | Err(BattleError::Cancelled | BattleError::TimedOut { .. }) => {
                world.enqueue_blocked(MoveBlockReason::Monster, position, "The battle was cancelled.");
                return Ok(());
            }
            Err(err) => {
                warn!(
                    tile = %position.key(),
                    code = err.error_code(),
                    severity = err.severity().as_str(),
                    error = %err,
                    "battle could not be started"
                );
                world.enqueue_blocked(
                    MoveBlockReason::Monster,
                    position,
                    "The battle could not be started.",
                );
                return Ok(());
            }
        };
        debug!(tile = %position.key(), outcome = %result.outcome, "battle finished");

        if let Some(changes) = &result.player {
            apply_attribute_changes(world.player_mut(), changes);
        }
        if let Some(rewards) = &result.rewards {
            apply_rewards(world, rewards);
        }
        world.update_ui();

        let monster_changes = result.monster.unwrap_or_default();
        let remaining_hp = monster_changes.apply_hp(monster.hp);
        let defeated =
            result.declares_defeat() || (monster_changes.touches_hp() && remaining_hp <= 0);
        let message = result.trimmed_message().map(str::to_string);

        if !defeated {
            if monster_changes.touches_hp() {
                if let Some(stored) = world.level_mut().monster_at_mut(position) {
                    stored.hp = remaining_hp;
                }
            }
            let name = non_empty(&monster.name).unwrap_or("Monster");
            let reason = message.unwrap_or_else(|| format!("{name} stands firm."));
            world.enqueue_blocked(MoveBlockReason::Monster, position, &reason);
            return Ok(());
        }

        clear_monster(world, position);
        if world.equipment_rewards() {
            let equipment = world.roll_equipment();
            world.add_item(equipment.gid, 1, Some(equipment.name));
            world.post_message(&format!("Obtained {}.", equipment.name));
            world.update_ui();
        }
        let name = non_empty(&monster.name).unwrap_or("the monster");
        let victory = message.unwrap_or_else(|| format!("You defeated {name}!"));
        world.post_message(&victory);
        world.enqueue_commit(position, true);
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn clear_monster(world: &mut TowerWorld, position: Position) {
    let level = world.level_mut();
    level.clear_cell(position);
    level.remove_marker(MarkerLayer::Monsters, position);
    level.remove_marker(MarkerLayer::Entities, position);
}

/// Overrides first, then deltas; every stat is clamped at zero.
fn apply_attribute_changes(player: &mut PlayerState, changes: &AttributeChanges) {
    fn apply(stat: &mut i32, absolute: Option<i32>, delta: Option<i32>) {
        if let Some(value) = absolute {
            *stat = value.max(0);
        }
        if let Some(delta) = delta {
            *stat = stat.saturating_add(delta).max(0);
        }
    }
    apply(&mut player.hp, changes.hp, changes.delta_hp);
    apply(&mut player.atk, changes.atk, changes.delta_atk);
    apply(&mut player.def, changes.def, changes.delta_def);
}

fn apply_rewards(world: &mut TowerWorld, rewards: &BattleRewards) {
    if let Some(keys) = rewards.keys.filter(|k| k.is_finite()).map(f64::floor) {
        if keys > 0.0 {
            world.apply_key_pickup(keys.min(f64::from(u32::MAX)) as u32);
        } else if keys < 0.0 {
            let lost = (-keys).min(f64::from(u32::MAX)) as u32;
            let player = world.player_mut();
            player.keys = player.keys.saturating_sub(lost);
        }
    }

    for item in &rewards.inventory {
        if item.gid.is_empty() {
            continue;
        }
        world.add_item(&item.gid, item.count, item.name.as_deref());
    }

    for message in &rewards.messages {
        let message = message.trim();
        if !message.is_empty() {
            world.post_message(message);
        }
    }
}
