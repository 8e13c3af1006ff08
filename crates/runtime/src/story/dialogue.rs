use serde::{Deserialize, Serialize};

/// What the dialogue surface shows for the current node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueState {
    pub speaker: String,
    /// Node text, followed by the reward line when the node has one.
    pub text: String,
    pub options: Vec<String>,
    pub can_prev: bool,
    pub can_next: bool,
    /// Terminal node: neither choices nor a `next` id.
    pub show_close: bool,
}

/// Dialogue surface owned by the host.
pub trait DialogueView: Send + Sync {
    fn show(&self, state: &DialogueState);

    fn hide(&self);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullDialogue;

impl DialogueView for NullDialogue {
    fn show(&self, _state: &DialogueState) {}

    fn hide(&self) {}
}
