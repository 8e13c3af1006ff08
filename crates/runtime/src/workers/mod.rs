//! Worker tasks that back the runtime orchestration.
//!
//! The game worker is the only task that touches the session; everything
//! else reaches it through commands.

mod game;

pub use game::{Command, GameWorker, StoryAction};
