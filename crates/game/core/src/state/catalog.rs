use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Display names for inventory gids.
///
/// Seeded from tileset metadata and object properties at load time. The
/// catalog is advisory only: inventory counts never depend on it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCatalog {
    names: HashMap<String, Option<String>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `gid`, keeping a previously known name when `name` is blank.
    pub fn register(&mut self, gid: &str, name: Option<&str>) {
        if gid.is_empty() {
            return;
        }
        let trimmed = name.map(str::trim).filter(|n| !n.is_empty());
        let entry = self.names.entry(gid.to_string()).or_default();
        if let Some(name) = trimmed {
            *entry = Some(name.to_string());
        }
    }

    pub fn contains(&self, gid: &str) -> bool {
        self.names.contains_key(gid)
    }

    pub fn name(&self, gid: &str) -> Option<&str> {
        self.names.get(gid).and_then(|n| n.as_deref())
    }

    /// Resolves a display name: catalog entry, then `fallback`, then the gid.
    ///
    /// Without a gid the fallback (or `"key"`) is returned.
    pub fn display_name(&self, gid: Option<&str>, fallback: Option<&str>) -> String {
        let fallback = fallback.filter(|f| !f.is_empty());
        let Some(gid) = gid.filter(|g| !g.is_empty()) else {
            return fallback.unwrap_or("key").to_string();
        };
        if let Some(name) = self.name(gid).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        fallback.unwrap_or(gid).to_string()
    }

    /// Registers every entry of `other`; names from `other` win.
    pub fn merge(&mut self, other: &ItemCatalog) {
        for (gid, name) in &other.names {
            self.register(gid, name.as_deref());
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
