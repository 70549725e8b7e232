//! Persisted levels: named JSON documents under the content directory.
//!
//! Level paths look like `maps/Courtyard`; a bare name is assumed to live
//! under `maps/`. The storage format is owned by the host, not the bridge.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::viewport::Viewport;
use super::world::World;

pub const DEFAULT_FOLDER: &str = "maps";
pub const DEFAULT_LEVEL: &str = "maps/Default";

#[derive(Debug, Serialize, Deserialize)]
struct LevelDoc {
    name: String,
    world: World,
    viewport: Viewport,
}

#[derive(Debug, Clone)]
pub struct LevelStore {
    content_dir: PathBuf,
    current: String,
    dirty: bool,
}

impl LevelStore {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            current: DEFAULT_LEVEL.to_string(),
            dirty: false,
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    pub fn current_name(&self) -> &str {
        self.current
            .rsplit('/')
            .next()
            .unwrap_or(self.current.as_str())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Accepts `Name` or `folder/Name`, with an optional `.json` suffix.
    pub fn normalize(level: &str) -> Result<String, String> {
        let trimmed = level.trim().trim_end_matches(".json");
        if trimmed.is_empty() {
            return Err("Level name is empty".to_string());
        }
        if trimmed.split('/').any(|seg| seg.is_empty() || seg == "..") {
            return Err(format!("Invalid level path: {level}"));
        }
        if trimmed.contains('/') {
            Ok(trimmed.to_string())
        } else {
            Ok(format!("{DEFAULT_FOLDER}/{trimmed}"))
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.file_for(path).is_file()
    }

    /// Create a new level from the built-in template (an empty world). Fails
    /// without side effects when the destination already exists.
    pub fn create(&self, folder: &str, level_name: &str) -> Result<String, String> {
        if level_name.trim().is_empty() {
            return Err("Level name is empty".to_string());
        }
        let dest = Self::normalize(&format!(
            "{}/{}",
            folder.trim_matches('/'),
            level_name.trim()
        ))?;
        if self.exists(&dest) {
            return Err(format!("Level already exists: {dest}"));
        }
        let doc = LevelDoc {
            name: level_name.trim().to_string(),
            world: World::default(),
            viewport: Viewport::default(),
        };
        self.write_doc(&dest, &doc)?;
        Ok(dest)
    }

    /// Load a level into the live world, replacing it. The caller decides
    /// whether dirty state was saved first.
    pub fn open(
        &mut self,
        path: &str,
        world: &mut World,
        viewport: &mut Viewport,
    ) -> Result<(), String> {
        let file = self.file_for(path);
        let text = std::fs::read_to_string(&file)
            .map_err(|e| format!("Failed to load level: {path} ({e})"))?;
        let doc: LevelDoc = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to load level: {path} ({e})"))?;
        *world = doc.world;
        *viewport = doc.viewport;
        self.current = path.to_string();
        self.dirty = false;
        Ok(())
    }

    /// Persist the live world under the current level path.
    pub fn save_current(&mut self, world: &World, viewport: &Viewport) -> Result<String, String> {
        let doc = LevelDoc {
            name: self.current_name().to_string(),
            world: world.clone(),
            viewport: viewport.clone(),
        };
        let path = self.current.clone();
        self.write_doc(&path, &doc)?;
        self.dirty = false;
        Ok(path)
    }

    fn file_for(&self, path: &str) -> PathBuf {
        let mut file = self.content_dir.join(path);
        file.set_extension("json");
        file
    }

    fn write_doc(&self, path: &str, doc: &LevelDoc) -> Result<(), String> {
        let file = self.file_for(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to save level: {path} ({e})"))?;
        }
        let text = serde_json::to_string_pretty(doc)
            .map_err(|e| format!("Failed to save level: {path} ({e})"))?;
        std::fs::write(&file, text).map_err(|e| format!("Failed to save level: {path} ({e})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::world::Actor;

    #[test]
    fn normalize_prepends_default_folder() {
        assert_eq!(LevelStore::normalize("Courtyard").unwrap(), "maps/Courtyard");
        assert_eq!(
            LevelStore::normalize("maps/Courtyard").unwrap(),
            "maps/Courtyard"
        );
        assert_eq!(
            LevelStore::normalize("maps/Courtyard.json").unwrap(),
            "maps/Courtyard"
        );
        assert!(LevelStore::normalize("").is_err());
        assert!(LevelStore::normalize("maps/../etc").is_err());
    }

    #[test]
    fn create_then_open_roundtrips_world_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LevelStore::new(dir.path());
        let mut world = World::default();
        let mut viewport = Viewport::default();

        world.spawn(Actor::new("Cube_1", "StaticMeshActor")).unwrap();
        store.mark_dirty();
        let saved = store.save_current(&world, &viewport).unwrap();
        assert_eq!(saved, DEFAULT_LEVEL);
        assert!(!store.is_dirty());

        let path = store.create(DEFAULT_FOLDER, "Annex").unwrap();
        assert_eq!(path, "maps/Annex");
        store.open(&path, &mut world, &mut viewport).unwrap();
        assert!(world.is_empty());
        assert_eq!(store.current_path(), "maps/Annex");

        store
            .open(DEFAULT_LEVEL, &mut world, &mut viewport)
            .unwrap();
        assert_eq!(world.actors()[0].name, "Cube_1");
    }

    #[test]
    fn create_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::new(dir.path());
        store.create("maps", "Twice").unwrap();
        let err = store.create("maps", "Twice").unwrap_err();
        assert_eq!(err, "Level already exists: maps/Twice");
    }

    #[test]
    fn open_missing_level_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LevelStore::new(dir.path());
        let mut world = World::default();
        let mut viewport = Viewport::default();
        let err = store
            .open("maps/Nowhere", &mut world, &mut viewport)
            .unwrap_err();
        assert!(err.contains("maps/Nowhere"), "got: {err}");
    }
}
