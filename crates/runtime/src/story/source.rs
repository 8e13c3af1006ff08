//! Where story documents come from.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use tower_content::{LoadError, StoryLoader};
use tower_core::{ErrorSeverity, GameError, StoryDocument};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("story not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("story loader task failed")]
    Join(#[source] tokio::task::JoinError),
}

impl GameError for StoryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            StoryError::NotFound(_) => "STORY_NOT_FOUND",
            StoryError::Load(_) => "STORY_LOAD_FAILED",
            StoryError::Join(_) => "STORY_JOIN_FAILED",
        }
    }
}

/// Fetches a story document by id; called once per story start.
#[async_trait]
pub trait StorySource: Send + Sync {
    async fn load(&self, story_id: &str) -> Result<StoryDocument, StoryError>;
}

/// Stories kept in memory, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorySource {
    stories: HashMap<String, StoryDocument>,
}

impl InMemoryStorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_story(mut self, story_id: impl Into<String>, document: StoryDocument) -> Self {
        self.insert(story_id, document);
        self
    }

    pub fn insert(&mut self, story_id: impl Into<String>, document: StoryDocument) {
        self.stories.insert(story_id.into(), document);
    }
}

#[async_trait]
impl StorySource for InMemoryStorySource {
    async fn load(&self, story_id: &str) -> Result<StoryDocument, StoryError> {
        self.stories
            .get(story_id)
            .cloned()
            .ok_or_else(|| StoryError::NotFound(story_id.to_string()))
    }
}

/// Reads `<dir>/<story_id>.json` on the blocking pool.
#[derive(Clone, Debug)]
pub struct DirectoryStorySource {
    dir: PathBuf,
}

impl DirectoryStorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl StorySource for DirectoryStorySource {
    async fn load(&self, story_id: &str) -> Result<StoryDocument, StoryError> {
        let path = StoryLoader::path_for(&self.dir, story_id);
        if !path.is_file() {
            return Err(StoryError::NotFound(story_id.to_string()));
        }
        let document = tokio::task::spawn_blocking(move || StoryLoader::load(&path))
            .await
            .map_err(StoryError::Join)??;
        Ok(document)
    }
}
