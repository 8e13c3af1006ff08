//! Unlockable articles ("journal") collected through story events.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub title: String,
}

/// Unlocked articles in unlock order; each id appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlocks `id`. Returns `false` for blank or already unlocked ids.
    pub fn unlock(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() || self.is_unlocked(id) {
            return false;
        }
        self.entries.push(JournalEntry {
            id: id.to_string(),
            title: title_from_id(id),
        });
        true
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `"password_basics"` becomes `"Password Basics"`.
pub fn title_from_id(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
