//! The single owner of one running session.
//!
//! [`GameRuntime`] pairs the [`TowerContext`] with the bus that drains into
//! it. Inputs only enqueue; nothing is dispatched until [`GameRuntime::drain`]
//! runs, so a burst of inputs collapses into one drain pass.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tower_core::{Direction, InventoryEntry, Level, MarkerLayer, PlayerState};

use crate::context::TowerContext;
use crate::events::{EventBus, GameEvent, MoveBlockReason};
use crate::handlers::register_default_handlers;
use crate::journal::JournalEntry;
use crate::story::{DialogueState, StoryManager};
use crate::world::TowerWorld;

/// What a directional input turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// A story session is active; movement is disabled.
    Ignored,
    /// A move attempt (or a bounds block) was enqueued.
    Queued,
    /// The destination holds a story trigger; `started` tells whether it loaded.
    Story { started: bool },
}

/// Read-only view of the session handed to hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub level: Level,
    pub floor: Option<u32>,
    pub player: PlayerState,
    pub inventory: Vec<InventoryEntry>,
    pub dialogue: Option<DialogueState>,
    pub journal: Vec<JournalEntry>,
}

pub struct GameRuntime {
    ctx: TowerContext,
    bus: EventBus<TowerContext>,
}

impl GameRuntime {
    /// Registers the default handlers, starts the bus and announces the level.
    pub fn new(world: TowerWorld, story: StoryManager) -> Self {
        Self::with_capacity(world, story, 100)
    }

    /// Like [`GameRuntime::new`] with an explicit observer channel capacity.
    pub fn with_capacity(world: TowerWorld, story: StoryManager, capacity: usize) -> Self {
        let mut bus = EventBus::with_capacity(world.events().clone(), capacity);
        register_default_handlers(&mut bus);
        bus.start();
        world.announce_level();
        Self {
            ctx: TowerContext::new(world, story),
            bus,
        }
    }

    pub fn world(&self) -> &TowerWorld {
        &self.ctx.world
    }

    pub fn world_mut(&mut self) -> &mut TowerWorld {
        &mut self.ctx.world
    }

    pub fn story(&self) -> &StoryManager {
        &self.ctx.story
    }

    pub fn bus(&self) -> &EventBus<TowerContext> {
        &self.bus
    }

    /// Extra subscriptions (observers, custom events) go through here.
    pub fn bus_mut(&mut self) -> &mut EventBus<TowerContext> {
        &mut self.bus
    }

    pub fn emit(&self, event: GameEvent) {
        self.bus.emit(event);
    }

    /// Turns a directional input into a move attempt.
    ///
    /// The player always turns to face `direction`. Stepping toward a story
    /// trigger starts the story instead of moving; a one-shot trigger is
    /// removed once its story has started.
    pub async fn input(&mut self, direction: Direction) -> InputOutcome {
        if self.ctx.story_active() {
            return InputOutcome::Ignored;
        }

        let TowerContext { world, story } = &mut self.ctx;
        world.player_mut().walk.face(direction);
        let from = world.player().position;
        let to = from.step(direction);

        if let Some(trigger) = world.level().story_trigger(to.key()).cloned() {
            let started = story.start(&trigger.story_id, world).await;
            if started && trigger.once {
                let level = world.level_mut();
                level.remove_story_trigger(to.key());
                level.remove_marker(MarkerLayer::Entities, to);
            }
            debug!(story = %trigger.story_id, started, "story trigger");
            return InputOutcome::Story { started };
        }

        if world.level().contains(to) {
            world.enqueue(GameEvent::move_attempt(from, to));
        } else {
            world.enqueue_blocked(MoveBlockReason::Bounds, to, "Cannot move beyond the map.");
        }
        InputOutcome::Queued
    }

    /// Dispatches everything queued so far, including follow-ups.
    pub async fn drain(&mut self) -> usize {
        self.bus.drain(&mut self.ctx).await
    }

    /// Input followed by a drain.
    pub async fn step(&mut self, direction: Direction) -> InputOutcome {
        let outcome = self.input(direction).await;
        self.drain().await;
        outcome
    }

    pub async fn start_story(&mut self, story_id: &str) -> bool {
        let TowerContext { world, story } = &mut self.ctx;
        story.start(story_id, world).await
    }

    pub fn story_next(&mut self) {
        let TowerContext { world, story } = &mut self.ctx;
        story.next(world);
    }

    pub fn story_prev(&mut self) {
        let TowerContext { world, story } = &mut self.ctx;
        story.prev(world);
    }

    pub fn story_choose(&mut self, index: usize) {
        let TowerContext { world, story } = &mut self.ctx;
        story.choose(index, world);
    }

    pub fn story_close(&mut self) {
        let TowerContext { world, story } = &mut self.ctx;
        story.end(world);
    }

    /// Restores the level-defined player state at the spawn cell.
    pub fn restart(&mut self) {
        self.ctx.world.reset_player_state();
    }

    pub fn debug_set_attributes(&mut self, hp: Option<f64>, atk: Option<f64>, def: Option<f64>) {
        self.ctx.world.debug_set_attributes(hp, atk, def);
    }

    pub fn debug_grant_item(&mut self, gid: &str, count: f64, name: Option<&str>) -> bool {
        self.ctx.world.debug_grant_item(gid, count, name)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let world = &self.ctx.world;
        GameSnapshot {
            level: world.level().clone(),
            floor: world.current_floor(),
            player: world.player().clone(),
            inventory: world.inventory_entries(),
            dialogue: self.ctx.story.dialogue().cloned(),
            journal: world.journal().entries().to_vec(),
        }
    }
}
