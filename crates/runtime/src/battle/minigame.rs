//! Registry of interactive battle mini-games.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::DEFAULT_MINI_GAME_ID;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniGameDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MiniGameDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            timeout_ms: None,
            description: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Descriptors in registration order plus a round-robin cursor.
#[derive(Clone, Debug, Default)]
pub struct MiniGameRegistry {
    descriptors: Vec<MiniGameDescriptor>,
    cursor: usize,
}

impl MiniGameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds descriptors; one with an already registered id replaces it in place.
    pub fn register(&mut self, descriptors: impl IntoIterator<Item = MiniGameDescriptor>) {
        for descriptor in descriptors {
            match self.descriptors.iter_mut().find(|d| d.id == descriptor.id) {
                Some(existing) => *existing = descriptor,
                None => self.descriptors.push(descriptor),
            }
        }
    }

    /// Replaces every descriptor and resets the rotation.
    pub fn set(&mut self, descriptors: impl IntoIterator<Item = MiniGameDescriptor>) {
        self.descriptors.clear();
        self.cursor = 0;
        self.register(descriptors);
    }

    pub fn get(&self, id: &str) -> Option<&MiniGameDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn descriptors(&self) -> &[MiniGameDescriptor] {
        &self.descriptors
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The preferred descriptor if registered, otherwise the next one in rotation.
    pub fn select(&mut self, preferred: Option<&str>) -> Option<&MiniGameDescriptor> {
        let preferred = preferred.map(str::trim).filter(|id| !id.is_empty());
        if let Some(index) =
            preferred.and_then(|id| self.descriptors.iter().position(|d| d.id == id))
        {
            return self.descriptors.get(index);
        }
        if self.descriptors.is_empty() {
            return None;
        }
        let index = self.cursor % self.descriptors.len();
        self.cursor = (index + 1) % self.descriptors.len();
        self.descriptors.get(index)
    }

    /// Id to put in a battle context; falls back to the default mini-game.
    pub fn select_id(&mut self, preferred: Option<&str>) -> String {
        self.select(preferred)
            .map(|d| d.id.clone())
            .unwrap_or_else(|| DEFAULT_MINI_GAME_ID.to_string())
    }
}
