//! Story sessions: document sources, the dialogue state machine and the
//! surface it renders to.

mod dialogue;
mod manager;
mod source;

pub use dialogue::{DialogueState, DialogueView, NullDialogue};
pub use manager::{GrantOutcome, NoStoryCallbacks, StoryCallbacks, StoryManager};
pub use source::{DirectoryStorySource, InMemoryStorySource, StoryError, StorySource};
