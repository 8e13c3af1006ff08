//! Game configuration loader.

use std::path::Path;

use tower_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Omitted sections and fields keep their defaults.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            door_key_cost = 2

            [player]
            hp = 250

            [monsters]
            atk = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.door_key_cost, 2);
        assert_eq!(config.player.hp, 250);
        assert_eq!(config.player.name, "Traveler");
        assert_eq!(config.monsters.atk, 9);
        assert_eq!(config.monsters.hp, 20);
        assert_eq!(config.items.hp, 50);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, crate::LoadError::Io { .. }));
    }
}
