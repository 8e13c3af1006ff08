//! Branching dialogue state machine.
//!
//! A session walks the nodes of one [`StoryDocument`]. History records the
//! visited node ids so `prev` can backtrack; rewards and node events fire at
//! most once per node per session, no matter how often the node is shown.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error, warn};

use tower_core::{GameError, StoryNode, StoryNodeEvent, StoryReward};

use super::dialogue::{DialogueState, DialogueView};
use super::source::StorySource;

/// Answer of [`StoryCallbacks::grant_item`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrantOutcome {
    pub success: bool,
    pub granted: u32,
    /// Count held after the attempt.
    pub current: u32,
}

/// Side effects a story session needs from the game.
pub trait StoryCallbacks: Send {
    /// A session became active.
    fn on_start(&mut self) {}

    /// The active session ended.
    fn on_end(&mut self) {}

    /// Grants a reward item; `None` means no inventory is wired in.
    fn grant_item(&mut self, _gid: &str, _amount: i64, _max: Option<i64>) -> Option<GrantOutcome> {
        None
    }

    fn inventory_name(&self, gid: &str) -> String {
        gid.to_string()
    }

    /// Forwards a node side-effect event to the game.
    fn emit_event(&mut self, _event: &StoryNodeEvent) {}
}

/// Callbacks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStoryCallbacks;

impl StoryCallbacks for NoStoryCallbacks {}

pub struct StoryManager {
    source: Arc<dyn StorySource>,
    view: Arc<dyn DialogueView>,
    active: Option<Session>,
}

struct Session {
    story_id: String,
    nodes: HashMap<String, StoryNode>,
    history: Vec<String>,
    current: Option<String>,
    reward_messages: HashMap<String, Option<String>>,
    emitted: HashSet<String>,
    dialogue: Option<DialogueState>,
}

impl StoryManager {
    pub fn new(source: Arc<dyn StorySource>, view: Arc<dyn DialogueView>) -> Self {
        Self {
            source,
            view,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn story_id(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.story_id.as_str())
    }

    pub fn current_node(&self) -> Option<&StoryNode> {
        let session = self.active.as_ref()?;
        session.nodes.get(session.current.as_deref()?)
    }

    pub fn history(&self) -> &[String] {
        self.active
            .as_ref()
            .map(|s| s.history.as_slice())
            .unwrap_or_default()
    }

    /// Dialogue currently on screen, if any.
    pub fn dialogue(&self) -> Option<&DialogueState> {
        self.active.as_ref()?.dialogue.as_ref()
    }

    /// Starts `story_id`, ending any active session first.
    ///
    /// Returns `false` when the story cannot be loaded; the previous session
    /// stays ended.
    pub async fn start<C>(&mut self, story_id: &str, callbacks: &mut C) -> bool
    where
        C: StoryCallbacks + ?Sized,
    {
        if self.is_active() {
            self.end(callbacks);
        }

        let document = match self.source.load(story_id).await {
            Ok(document) => document,
            Err(err) => {
                error!(story = story_id, code = err.error_code(), error = %err, "failed to start story");
                return false;
            }
        };

        debug!(story = story_id, nodes = document.nodes.len(), "story started");
        callbacks.on_start();
        let start = document.start.clone();
        self.active = Some(Session {
            story_id: story_id.to_string(),
            nodes: document
                .nodes
                .into_iter()
                .map(|node| (node.id.clone(), node))
                .collect(),
            history: vec![start.clone()],
            current: None,
            reward_messages: HashMap::new(),
            emitted: HashSet::new(),
            dialogue: None,
        });
        self.set_node(&start, false, callbacks);
        true
    }

    /// Follows `next` on a node without choices; ends the session on a terminal node.
    pub fn next<C>(&mut self, callbacks: &mut C)
    where
        C: StoryCallbacks + ?Sized,
    {
        let Some(node) = self.current_node() else {
            return;
        };
        if node.has_options() {
            return;
        }
        match node.next.clone() {
            Some(next) => self.set_node(&next, true, callbacks),
            None => self.end(callbacks),
        }
    }

    /// Steps back one node without growing history.
    pub fn prev<C>(&mut self, callbacks: &mut C)
    where
        C: StoryCallbacks + ?Sized,
    {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        if session.current.is_none() || session.history.len() <= 1 {
            return;
        }
        session.history.pop();
        let Some(previous) = session.history.last().cloned() else {
            return;
        };
        self.set_node(&previous, false, callbacks);
    }

    /// Picks choice `index` of the current node; out-of-range indices are ignored.
    pub fn choose<C>(&mut self, index: usize, callbacks: &mut C)
    where
        C: StoryCallbacks + ?Sized,
    {
        let Some(target) = self
            .current_node()
            .and_then(|node| node.options.get(index))
            .map(|option| option.target.clone())
        else {
            return;
        };
        self.set_node(&target, true, callbacks);
    }

    /// Ends the active session; no-op when inactive.
    pub fn end<C>(&mut self, callbacks: &mut C)
    where
        C: StoryCallbacks + ?Sized,
    {
        let Some(session) = self.active.take() else {
            return;
        };
        debug!(story = %session.story_id, "story ended");
        self.view.hide();
        callbacks.on_end();
    }

    fn set_node<C>(&mut self, node_id: &str, push_history: bool, callbacks: &mut C)
    where
        C: StoryCallbacks + ?Sized,
    {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        let Some(node) = session.nodes.get(node_id).cloned() else {
            warn!(story = %session.story_id, node = node_id, "missing story node");
            self.end(callbacks);
            return;
        };

        if push_history {
            session.history.push(node_id.to_string());
        }
        session.current = Some(node_id.to_string());

        let reward_line = match session.reward_messages.get(node_id) {
            Some(cached) => cached.clone(),
            None => {
                let message = node
                    .reward
                    .as_ref()
                    .map(|reward| reward_message(reward, callbacks));
                session
                    .reward_messages
                    .insert(node_id.to_string(), message.clone());
                message
            }
        };

        if session.emitted.insert(node_id.to_string()) {
            for event in &node.events {
                callbacks.emit_event(event);
            }
        }

        let has_options = node.has_options();
        let text = match reward_line {
            Some(message) => format!("{}\n{}", node.text, message),
            None => node.text.clone(),
        };
        let state = DialogueState {
            speaker: node.speaker.clone(),
            text,
            options: node.options.iter().map(|o| o.text.clone()).collect(),
            can_prev: session.history.len() > 1,
            can_next: !has_options && node.next.is_some(),
            show_close: !has_options && node.next.is_none(),
        };
        self.view.show(&state);
        session.dialogue = Some(state);
    }
}

fn reward_message<C>(reward: &StoryReward, callbacks: &mut C) -> String
where
    C: StoryCallbacks + ?Sized,
{
    let amount = reward.amount.unwrap_or(1);
    let name = callbacks.inventory_name(&reward.gid);

    let Some(outcome) = callbacks.grant_item(&reward.gid, amount, reward.max) else {
        return reward
            .message
            .clone()
            .unwrap_or_else(|| format!("Received {amount} {name}."));
    };

    if outcome.success {
        if let Some(message) = &reward.message {
            return message.clone();
        }
        return if outcome.granted > 1 {
            format!("Received {} × {name}.", outcome.granted)
        } else {
            format!("Received {name}.")
        };
    }

    if let Some(message) = &reward.limit_message {
        return message.clone();
    }
    let limit = reward.max.unwrap_or(i64::from(outcome.current));
    if limit > 0 {
        format!("You already have the maximum number of {name} ({limit}).")
    } else {
        format!("You already have enough {name}.")
    }
}
