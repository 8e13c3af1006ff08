//! Content loaders for reading game data from files.

pub mod config;
pub mod error;
pub mod factory;
pub mod map;
pub mod story;

pub use config::ConfigLoader;
pub use error::{LoadError, LoadResult};
pub use factory::ContentFactory;
pub use map::{MapLoader, TiledMap};
pub use story::StoryLoader;

use std::path::Path;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
