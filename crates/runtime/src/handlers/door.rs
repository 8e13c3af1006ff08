//! Door encounters and door-unlocker proxies.

use async_trait::async_trait;
use tracing::debug;

use tower_core::{DoorUnlocker, MarkerLayer, Position};

use crate::context::TowerContext;
use crate::events::{EventHandler, EventPayload, GameEvent, HandlerError, MoveBlockReason};
use crate::world::TowerWorld;

/// What opening a door costs.
enum Toll {
    /// One unit of an inventory item, shown under `name`.
    Item { gid: String, name: String },
    /// Generic keys; zero means the door is free.
    Keys(u32),
}

impl Toll {
    fn new(world: &TowerWorld, require: Option<&str>, require_name: Option<&str>, keys: u32) -> Self {
        match require.filter(|gid| !gid.is_empty()) {
            Some(gid) => Toll::Item {
                gid: gid.to_string(),
                name: world.inventory_name(Some(gid), require_name),
            },
            None => Toll::Keys(keys),
        }
    }

    /// Pays the toll, returning the success message or the refusal.
    fn pay(self, world: &mut TowerWorld) -> Result<String, (MoveBlockReason, String)> {
        match self {
            Toll::Item { gid, name } => {
                if world.consume_item(&gid, 1) {
                    Ok(format!("You used {name} to open the door."))
                } else {
                    Err((
                        MoveBlockReason::Door,
                        format!("You need {name} to open this door."),
                    ))
                }
            }
            Toll::Keys(0) => Ok("The door unlocks.".to_string()),
            Toll::Keys(need) => {
                if world.player_mut().spend_keys(need) {
                    Ok(format!("Used {need} key(s). The door opened."))
                } else {
                    Err((MoveBlockReason::Keys, format!("Need {need} key(s).")))
                }
            }
        }
    }
}

/// Opens a door the player walks into, paying its item or key toll.
///
/// A refused toll blocks the move and leaves the door closed. An opened door
/// reverts to floor, takes its linked unlockers with it, and the move commits
/// onto the door cell.
#[derive(Debug, Clone, Copy)]
pub struct DoorEncounterHandler;

#[async_trait]
impl EventHandler<TowerContext> for DoorEncounterHandler {
    fn name(&self) -> &'static str {
        "door_encounter"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::DoorEncounter { position } = event.payload else {
            return Ok(());
        };
        let world = &mut ctx.world;
        let Some(door) = world.level().door_at(position).cloned() else {
            return Err(HandlerError::new(format!("no door at {}", position.key())));
        };

        let toll = Toll::new(
            world,
            door.require.as_deref(),
            door.require_name.as_deref(),
            door.key_cost,
        );

        match toll.pay(world) {
            Ok(message) => {
                world.post_message(&message);
                world.level_mut().open_door(position);
                debug!(tile = %position.key(), "door opened");
                world.update_ui();
                world.enqueue_commit(position, true);
            }
            Err((reason, message)) => world.enqueue_blocked(reason, position, &message),
        }
        Ok(())
    }
}

/// Resolves a step onto a door-unlocker proxy at `proxy`.
///
/// The linked door's requirement is checked (falling back to the proxy's own).
/// On success the linked door opens, the proxy's marker goes away and the
/// move commits onto the proxy cell.
pub(crate) fn resolve_unlocker(world: &mut TowerWorld, proxy: Position, unlocker: &DoorUnlocker) {
    let door_pos = unlocker.door.map(|key| key.position());
    let door = door_pos.and_then(|pos| world.level().door_at(pos).cloned());

    let require = door
        .as_ref()
        .and_then(|d| d.require.clone())
        .or_else(|| unlocker.require.clone());
    let require_name = door
        .as_ref()
        .and_then(|d| d.require_name.clone())
        .or_else(|| unlocker.require_name.clone());
    let keys = door.as_ref().map_or(0, |d| d.key_cost);

    let toll = Toll::new(world, require.as_deref(), require_name.as_deref(), keys);
    match toll.pay(world) {
        Ok(message) => world.post_message(&message),
        Err((_, message)) => {
            world.enqueue_blocked(MoveBlockReason::Keys, proxy, &message);
            return;
        }
    }

    let level = world.level_mut();
    match door_pos {
        Some(pos) => {
            level.open_door(pos);
            level.remove_unlockers_for_door(pos.key());
        }
        None => {
            level.remove_unlocker(proxy.key());
        }
    }
    level.remove_marker(MarkerLayer::Entities, proxy);
    debug!(proxy = %proxy.key(), "door unlocker used");
    world.update_ui();
    world.enqueue_commit(proxy, true);
}
