//! Story document loader.
//!
//! Stories live one per file as `<dir>/<story_id>.json`.

use std::path::{Path, PathBuf};

use tower_core::StoryDocument;

use crate::loaders::{LoadResult, read_file};

pub struct StoryLoader;

impl StoryLoader {
    pub fn load(path: &Path) -> LoadResult<StoryDocument> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<StoryDocument> {
        Ok(serde_json::from_str(content)?)
    }

    /// Path of `story_id` inside `dir`.
    pub fn path_for(dir: &Path, story_id: &str) -> PathBuf {
        dir.join(format!("{story_id}.json"))
    }

    pub fn load_from_dir(dir: &Path, story_id: &str) -> LoadResult<StoryDocument> {
        Self::load(&Self::path_for(dir, story_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoadError;

    #[test]
    fn loads_story_by_id_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("guide.json"),
            r#"{"start": "a", "nodes": [{"id": "a", "speaker": "Guide", "text": "Hi"}]}"#,
        )
        .unwrap();

        let doc = StoryLoader::load_from_dir(dir.path(), "guide").unwrap();
        assert_eq!(doc.start, "a");
        assert_eq!(doc.nodes.len(), 1);

        let err = StoryLoader::load_from_dir(dir.path(), "missing").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn malformed_story_is_json_error() {
        let err = StoryLoader::parse(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }
}
