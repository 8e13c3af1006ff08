//! Presentation hooks the game world reports to.
//!
//! The runtime never renders anything itself; it posts messages and state
//! changes through [`UiHooks`] and lets the host decide what to show.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tower_core::PlayerState;

pub trait UiHooks: Send + Sync {
    /// Appends a line to the message log.
    fn post_message(&self, message: &str);

    /// Player stats, keys or inventory changed.
    fn update_stats(&self, player: &PlayerState);

    /// The active level or floor changed name.
    fn update_level_name(&self, name: &str);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullUi;

impl UiHooks for NullUi {
    fn post_message(&self, _message: &str) {}

    fn update_stats(&self, _player: &PlayerState) {}

    fn update_level_name(&self, _name: &str) {}
}

/// Keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingUi {
    inner: Mutex<Recorded>,
}

#[derive(Clone, Debug, Default)]
struct Recorded {
    messages: Vec<String>,
    level_names: Vec<String>,
    stat_updates: usize,
    last_stats: Option<PlayerState>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().messages.clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.lock().messages.last().cloned()
    }

    /// Removes and returns every recorded message.
    pub fn take_messages(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().messages)
    }

    pub fn level_names(&self) -> Vec<String> {
        self.lock().level_names.clone()
    }

    pub fn stat_updates(&self) -> usize {
        self.lock().stat_updates
    }

    pub fn last_stats(&self) -> Option<PlayerState> {
        self.lock().last_stats.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiHooks for RecordingUi {
    fn post_message(&self, message: &str) {
        self.lock().messages.push(message.to_string());
    }

    fn update_stats(&self, player: &PlayerState) {
        let mut inner = self.lock();
        inner.stat_updates += 1;
        inner.last_stats = Some(player.clone());
    }

    fn update_level_name(&self, name: &str) {
        self.lock().level_names.push(name.to_string());
    }
}
