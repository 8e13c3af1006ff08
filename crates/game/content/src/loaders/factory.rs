//! Content factory for loading everything from a data directory.

use std::path::{Path, PathBuf};

use tower_core::{GameConfig, Level, StoryDocument};

use crate::loaders::{ConfigLoader, LoadResult, MapLoader, StoryLoader};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml        (optional)
/// ├── levels/
/// │   ├── floor_1.json
/// │   └── floor_2.json
/// └── story/
///     └── guide.json
/// ```
#[derive(Clone, Debug)]
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn levels_dir(&self) -> PathBuf {
        self.data_dir.join("levels")
    }

    pub fn story_dir(&self) -> PathBuf {
        self.data_dir.join("story")
    }

    /// Load `config.toml`, falling back to defaults when the file is absent.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(GameConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load `levels/<name>.json`.
    pub fn load_level(&self, name: &str, config: &GameConfig) -> LoadResult<Level> {
        let path = self.levels_dir().join(format!("{name}.json"));
        MapLoader::load(&path, config)
    }

    pub fn load_story(&self, story_id: &str) -> LoadResult<StoryDocument> {
        StoryLoader::load_from_dir(&self.story_dir(), story_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), GameConfig::default());

        std::fs::write(dir.path().join("config.toml"), "cell_size = 32\n").unwrap();
        assert_eq!(factory.load_config().unwrap().cell_size, 32);
    }
}
