use std::path::PathBuf;

use tower_core::{ErrorSeverity, GameError, LevelError};

/// Common result type for loaders.
pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config TOML")]
    Toml(#[from] toml::de::Error),

    #[error("missing tile layer: {0}")]
    MissingTileLayer(&'static str),

    #[error("missing object layer: {0}")]
    MissingObjectLayer(&'static str),

    #[error("map declares no tileset")]
    MissingTileset,

    #[error("tile layer {layer} uses unsupported encoding {encoding:?}; export as CSV/array")]
    UnsupportedEncoding { layer: String, encoding: String },

    #[error("tile layer {layer} has {actual} cells, expected {expected}")]
    LayerSize {
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error("map cell size must be positive")]
    InvalidCellSize,

    #[error(transparent)]
    Level(#[from] LevelError),
}

impl GameError for LoadError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            LoadError::Io { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "LOAD_IO",
            LoadError::Json(_) => "LOAD_JSON",
            LoadError::Toml(_) => "LOAD_TOML",
            LoadError::MissingTileLayer(_) => "LOAD_MISSING_TILE_LAYER",
            LoadError::MissingObjectLayer(_) => "LOAD_MISSING_OBJECT_LAYER",
            LoadError::MissingTileset => "LOAD_MISSING_TILESET",
            LoadError::UnsupportedEncoding { .. } => "LOAD_UNSUPPORTED_ENCODING",
            LoadError::LayerSize { .. } => "LOAD_LAYER_SIZE",
            LoadError::InvalidCellSize => "LOAD_INVALID_CELL_SIZE",
            LoadError::Level(err) => err.error_code(),
        }
    }
}
