//! Handlers for the move pipeline itself: classify, block, commit.

use async_trait::async_trait;
use tracing::debug;

use tower_core::Cell;

use super::door::resolve_unlocker;
use crate::context::TowerContext;
use crate::events::{EventHandler, EventPayload, GameEvent, HandlerError, MoveBlockReason, Trigger};
use crate::world::MoveAttempt;

/// Classifies the destination of a move attempt and enqueues the next step.
///
/// Nothing is mutated here apart from the pending-move record; every outcome
/// is expressed as a follow-up event (blocked, an encounter, or a commit).
/// Door-unlocker proxies are the one exception: they resolve inline.
#[derive(Debug, Clone, Copy)]
pub struct MoveAttemptHandler;

#[async_trait]
impl EventHandler<TowerContext> for MoveAttemptHandler {
    fn name(&self) -> &'static str {
        "move_attempt"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::MoveAttempt { from, to } = event.payload else {
            return Ok(());
        };
        let world = &mut ctx.world;

        if !world.level().contains(to) {
            world.enqueue_blocked(MoveBlockReason::Bounds, to, "Cannot move beyond the map.");
            return Ok(());
        }

        world.set_last_move(MoveAttempt { from, to });

        let key = to.key();
        let unlocker = world.level().unlocker(key).cloned();
        let cell = world.level().cell(to).cloned().unwrap_or_default();
        debug!(tile = %key, cell = %cell.tile_type(), "classifying move");

        let follow_up = match cell {
            Cell::Wall => GameEvent::move_blocked(
                MoveBlockReason::Wall,
                to,
                "A wall blocks the way.".to_string(),
            ),
            Cell::Door(_) if unlocker.is_none() => encounter(EventPayload::DoorEncounter { position: to }),
            Cell::Monster(_) => encounter(EventPayload::MonsterEncounter { position: to }),
            Cell::Item(item) => encounter(EventPayload::ItemEncounter {
                position: to,
                tile_type: item.kind.tile_type(),
            }),
            Cell::Stairs(direction) => encounter(EventPayload::StairsEncounter {
                position: to,
                direction,
            }),
            Cell::Door(_) | Cell::Floor => {
                if let Some(unlocker) = unlocker {
                    resolve_unlocker(world, to, &unlocker);
                    return Ok(());
                }
                if world.level().has_blocking_object(to) {
                    GameEvent::move_blocked(
                        MoveBlockReason::Entity,
                        to,
                        "Something blocks the way.".to_string(),
                    )
                } else {
                    GameEvent::move_commit(from, to, true)
                }
            }
        };
        world.enqueue(follow_up);
        Ok(())
    }
}

fn encounter(payload: EventPayload) -> GameEvent {
    GameEvent::new(Trigger::System, payload)
}

/// Drops the pending move and surfaces the reason, if any.
#[derive(Debug, Clone, Copy)]
pub struct MoveBlockedHandler;

#[async_trait]
impl EventHandler<TowerContext> for MoveBlockedHandler {
    fn name(&self) -> &'static str {
        "move_blocked"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::MoveBlocked {
            reason, message, ..
        } = &event.payload
        else {
            return Ok(());
        };
        debug!(%reason, "move blocked");
        ctx.world.clear_last_move();
        if let Some(message) = message.as_deref().filter(|m| !m.is_empty()) {
            ctx.world.post_message(message);
        }
        Ok(())
    }
}

/// The only handler that moves the player.
#[derive(Debug, Clone, Copy)]
pub struct MoveCommitHandler;

#[async_trait]
impl EventHandler<TowerContext> for MoveCommitHandler {
    fn name(&self) -> &'static str {
        "move_commit"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::MoveCommit {
            to, advance_frame, ..
        } = event.payload
        else {
            return Ok(());
        };
        ctx.world.commit_move(to, advance_frame);
        ctx.world.clear_last_move();
        Ok(())
    }
}
