//! State handed to every bus handler.

use crate::story::StoryManager;
use crate::world::TowerWorld;

/// Everything a handler may read or mutate while an event is dispatched.
pub struct TowerContext {
    pub world: TowerWorld,
    pub story: StoryManager,
}

impl TowerContext {
    pub fn new(world: TowerWorld, story: StoryManager) -> Self {
        Self { world, story }
    }

    pub fn story_active(&self) -> bool {
        self.story.is_active()
    }
}
