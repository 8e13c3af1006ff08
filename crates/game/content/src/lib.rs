//! Data-driven content loaders.
//!
//! This crate reads authored content and normalises it into `tower-core`
//! values:
//! - Tiled-style JSON maps (tile layers plus object layers) into a [`Level`]
//! - Story documents (`<story_dir>/<id>.json`)
//! - Game configuration (TOML)
//!
//! Loading is fatal on malformed input: a level that fails to load must abort
//! startup rather than run half-populated.
//!
//! [`Level`]: tower_core::Level

pub mod loaders;

pub use loaders::{
    ConfigLoader, ContentFactory, LoadError, LoadResult, MapLoader, StoryLoader, TiledMap,
};
