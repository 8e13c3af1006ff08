//! Stairs encounters.

use async_trait::async_trait;
use tracing::debug;

use crate::context::TowerContext;
use crate::events::{EventHandler, EventPayload, GameEvent, HandlerError};
use crate::world::StairsBehaviour;

/// Completes the level, or changes floor when floor progression is on.
///
/// A floor change that cannot happen (no floor in that direction, or the
/// floor fails to load) falls back to completing the level.
#[derive(Debug, Clone, Copy)]
pub struct StairsEncounterHandler;

#[async_trait]
impl EventHandler<TowerContext> for StairsEncounterHandler {
    fn name(&self) -> &'static str {
        "stairs_encounter"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::StairsEncounter {
            position,
            direction,
        } = event.payload
        else {
            return Ok(());
        };
        let world = &mut ctx.world;

        if world.stairs_behaviour() == StairsBehaviour::Floors
            && world.change_floor(direction).await
        {
            return Ok(());
        }

        debug!(tile = %position.key(), %direction, "level complete");
        let message = format!("{} complete!", world.level().name());
        world.post_message(&message);
        world.enqueue_commit(position, true);
        Ok(())
    }
}
