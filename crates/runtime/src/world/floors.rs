//! Multi-floor progression.
//!
//! Leaving a floor snapshots its level state and the player's position;
//! returning to it restores the snapshot instead of loading a fresh copy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tower_content::{LoadError, MapLoader};
use tower_core::{GameConfig, Level, Position, StairsDirection};

/// What stepping on stairs does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StairsBehaviour {
    /// Announce the level as complete and step onto the stairs.
    #[default]
    CompleteLevel,
    /// Move to the next or previous floor.
    Floors,
}

#[derive(Debug, Error)]
pub enum FloorError {
    #[error("no level available for floor {0}")]
    Missing(u32),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("floor loader task failed")]
    Join(#[source] tokio::task::JoinError),
}

/// Supplies a fresh level for a floor number (1-based).
#[async_trait]
pub trait FloorSource: Send + Sync {
    async fn load_floor(&self, floor: u32) -> Result<Level, FloorError>;
}

/// Loads `floor_<n>.json` from a directory, falling back to one shared map.
#[derive(Clone, Debug)]
pub struct DirectoryFloorSource {
    dir: PathBuf,
    fallback: Option<PathBuf>,
    config: GameConfig,
}

impl DirectoryFloorSource {
    pub fn new(dir: impl Into<PathBuf>, config: GameConfig) -> Self {
        Self {
            dir: dir.into(),
            fallback: None,
            config,
        }
    }

    /// Map used for floors without a dedicated file.
    pub fn with_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback = Some(path.into());
        self
    }

    fn path_for(&self, floor: u32) -> Option<PathBuf> {
        let dedicated = self.dir.join(format!("floor_{floor}.json"));
        if dedicated.is_file() {
            return Some(dedicated);
        }
        self.fallback.clone().filter(|p| p.is_file())
    }
}

#[async_trait]
impl FloorSource for DirectoryFloorSource {
    async fn load_floor(&self, floor: u32) -> Result<Level, FloorError> {
        let path = self.path_for(floor).ok_or(FloorError::Missing(floor))?;
        let config = self.config.clone();
        let level = tokio::task::spawn_blocking(move || MapLoader::load(&path, &config))
            .await
            .map_err(FloorError::Join)??;
        Ok(level)
    }
}

pub(crate) struct FloorSnapshot {
    pub level: Level,
    pub position: Position,
}

/// Current floor number plus the snapshots of floors left behind.
pub struct FloorProgress {
    current: u32,
    snapshots: BTreeMap<u32, FloorSnapshot>,
    source: Arc<dyn FloorSource>,
}

impl FloorProgress {
    pub fn new(source: Arc<dyn FloorSource>) -> Self {
        Self::starting_at(source, 1)
    }

    pub fn starting_at(source: Arc<dyn FloorSource>, floor: u32) -> Self {
        Self {
            current: floor.max(1),
            snapshots: BTreeMap::new(),
            source,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Floor the stairs lead to, or `None` when they lead nowhere.
    pub fn target(&self, direction: StairsDirection) -> Option<u32> {
        let target = match direction {
            StairsDirection::Up => self.current.saturating_add(1),
            StairsDirection::Down => self.current.saturating_sub(1).max(1),
        };
        (target != self.current).then_some(target)
    }

    pub fn has_snapshot(&self, floor: u32) -> bool {
        self.snapshots.contains_key(&floor)
    }

    pub(crate) fn source(&self) -> Arc<dyn FloorSource> {
        Arc::clone(&self.source)
    }

    pub(crate) fn take_snapshot(&mut self, floor: u32) -> Option<FloorSnapshot> {
        self.snapshots.remove(&floor)
    }

    /// Stores the floor being left and makes `next` current.
    pub(crate) fn leave(&mut self, snapshot: FloorSnapshot, next: u32) {
        self.snapshots.insert(self.current, snapshot);
        self.current = next;
    }
}

pub fn floor_name(floor: u32) -> String {
    format!("Floor {floor}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    #[async_trait]
    impl FloorSource for Never {
        async fn load_floor(&self, floor: u32) -> Result<Level, FloorError> {
            Err(FloorError::Missing(floor))
        }
    }

    #[test]
    fn down_from_first_floor_leads_nowhere() {
        let progress = FloorProgress::new(Arc::new(Never));
        assert_eq!(progress.target(StairsDirection::Down), None);
        assert_eq!(progress.target(StairsDirection::Up), Some(2));

        let upper = FloorProgress::starting_at(Arc::new(Never), 3);
        assert_eq!(upper.target(StairsDirection::Down), Some(2));
    }

    #[test]
    fn stairs_behaviour_parses() {
        assert_eq!("floors".parse::<StairsBehaviour>().unwrap(), StairsBehaviour::Floors);
        assert_eq!(
            "Complete_Level".parse::<StairsBehaviour>().unwrap(),
            StairsBehaviour::CompleteLevel
        );
    }

    #[tokio::test]
    async fn directory_source_prefers_dedicated_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryFloorSource::new(dir.path(), GameConfig::default());
        assert!(matches!(source.load_floor(2).await, Err(FloorError::Missing(2))));
    }
}
