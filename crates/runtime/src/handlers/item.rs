//! Item pickups.

use async_trait::async_trait;
use tracing::debug;

use tower_core::{ItemKind, MarkerLayer};

use crate::context::TowerContext;
use crate::events::{EventHandler, EventPayload, GameEvent, HandlerError};

/// Applies a key or stat pickup, clears the tile and commits onto it.
#[derive(Debug, Clone, Copy)]
pub struct ItemPickupHandler;

#[async_trait]
impl EventHandler<TowerContext> for ItemPickupHandler {
    fn name(&self) -> &'static str {
        "item_pickup"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::ItemEncounter { position, .. } = event.payload else {
            return Ok(());
        };
        let world = &mut ctx.world;
        let Some(item) = world.level().item_at(position).cloned() else {
            return Err(HandlerError::new(format!("no item at {}", position.key())));
        };
        let value = item.value_or_default(&world.config().items);

        let message = match item.kind {
            ItemKind::Key => match item.gid.as_deref().filter(|gid| !gid.is_empty()) {
                Some(gid) => {
                    world.add_item(gid, i64::from(value), item.name.as_deref());
                    let name = world.inventory_name(Some(gid), item.name.as_deref());
                    if value > 1 {
                        format!("Obtained {name} x{value}.")
                    } else {
                        format!("Obtained {name}.")
                    }
                }
                None => {
                    world.apply_key_pickup(u32::try_from(value).unwrap_or(0));
                    format!("Picked up key x{value}.")
                }
            },
            ItemKind::Hp => {
                let player = world.player_mut();
                player.hp = player.hp.saturating_add(value);
                format!("HP +{value}")
            }
            ItemKind::Atk => {
                let player = world.player_mut();
                player.atk = player.atk.saturating_add(value);
                format!("ATK +{value}")
            }
            ItemKind::Def => {
                let player = world.player_mut();
                player.def = player.def.saturating_add(value);
                format!("DEF +{value}")
            }
        };
        world.post_message(&message);

        let level = world.level_mut();
        level.clear_cell(position);
        level.remove_marker(MarkerLayer::Items, position);
        level.remove_marker(MarkerLayer::Entities, position);
        debug!(tile = %position.key(), kind = %item.kind, "item picked up");

        world.update_ui();
        world.enqueue_commit(position, true);
        Ok(())
    }
}
