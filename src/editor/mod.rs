//! The reference editor host: a small, headless stand-in for the live
//! application the bridge drives. World, selection, viewport and level state
//! live here; all mutation goes through the host thread via the gate.

pub mod levels;
pub mod viewport;
pub mod world;

use std::path::PathBuf;

use serde_json::Value;

use levels::LevelStore;
use viewport::Viewport;
use world::{Actor, World};

/// The explicitly passed host context threaded through every command handler
/// and scripting call. No hidden globals.
#[derive(Debug)]
pub struct EditorState {
    pub world: World,
    pub viewport: Viewport,
    pub levels: LevelStore,
    /// Selected actor names, in selection order.
    pub selection: Vec<String>,
}

impl EditorState {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            world: World::default(),
            viewport: Viewport::default(),
            levels: LevelStore::new(content_dir),
            selection: Vec::new(),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.levels.mark_dirty();
    }

    // --- selection ---

    /// Selected actors that still exist, in selection order.
    pub fn selected_actors(&self) -> Vec<&Actor> {
        self.selection
            .iter()
            .filter_map(|name| self.world.find(name))
            .collect()
    }

    /// Replace the selection. Returns the names found and the names that
    /// matched nothing, preserving request order.
    pub fn set_selection(&mut self, names: &[String]) -> (Vec<String>, Vec<String>) {
        let mut found = Vec::new();
        let mut not_found = Vec::new();
        for name in names {
            if self.world.find(name).is_some() {
                found.push(name.clone());
            } else {
                not_found.push(name.clone());
            }
        }
        self.selection = found.clone();
        (found, not_found)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete an actor and prune it from the selection.
    pub fn delete_actor(&mut self, name: &str) -> Option<Actor> {
        let removed = self.world.delete(name)?;
        self.selection.retain(|n| n != name);
        Some(removed)
    }

    // --- viewport ---

    /// Focus the viewport on a named actor. Errors when the actor is absent.
    pub fn focus_on_target(&mut self, target: &str, distance: f64) -> Result<[f64; 3], String> {
        let location = self
            .world
            .find(target)
            .map(|a| a.location)
            .ok_or_else(|| format!("Actor not found: {target}"))?;
        self.viewport.focus(location, distance);
        Ok(location)
    }

    pub fn take_screenshot(&self, filepath: &str) -> Result<String, String> {
        self.viewport
            .screenshot(filepath)
            .map(|p| p.to_string_lossy().to_string())
    }

    // --- levels ---

    pub fn level_info(&self) -> Value {
        serde_json::json!({
            "level_path": self.levels.current_path(),
            "level_name": self.levels.current_name(),
            "actor_count": self.world.len(),
            "is_dirty": self.levels.is_dirty(),
        })
    }

    /// Create a level from the template; optionally open it immediately.
    pub fn create_level(
        &mut self,
        level_name: &str,
        folder: &str,
        open_after_create: bool,
    ) -> Result<(String, bool), String> {
        let path = self.levels.create(folder, level_name)?;
        if open_after_create {
            self.open_level_at(&path)?;
        }
        Ok((path, open_after_create))
    }

    /// Open a level by name or path, optionally saving dirty state first.
    pub fn open_level(&mut self, level: &str, save_dirty: bool) -> Result<String, String> {
        let path = LevelStore::normalize(level)?;
        if !self.levels.exists(&path) {
            return Err(format!("Level not found: {path}"));
        }
        if save_dirty && self.levels.is_dirty() {
            self.levels.save_current(&self.world, &self.viewport)?;
        }
        self.open_level_at(&path)?;
        Ok(path)
    }

    fn open_level_at(&mut self, path: &str) -> Result<(), String> {
        self.selection.clear();
        self.levels
            .open(path, &mut self.world, &mut self.viewport)
    }

    pub fn save_current_level(&mut self) -> Result<String, String> {
        self.levels.save_current(&self.world, &self.viewport)
    }

    /// Save everything that is dirty. The reference host holds a single open
    /// level, so this is the current level or a no-op.
    pub fn save_all_levels(&mut self) -> bool {
        if self.levels.is_dirty() {
            self.levels.save_current(&self.world, &self.viewport).is_ok()
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> (tempfile::TempDir, EditorState) {
        let dir = tempfile::tempdir().unwrap();
        let state = EditorState::new(dir.path());
        (dir, state)
    }

    #[test]
    fn selection_reports_found_and_missing() {
        let (_dir, mut ed) = editor();
        ed.world.spawn(Actor::new("A", "PointLight")).unwrap();
        ed.world.spawn(Actor::new("B", "SpotLight")).unwrap();

        let (found, not_found) =
            ed.set_selection(&["B".to_string(), "Ghost".to_string(), "A".to_string()]);
        assert_eq!(found, vec!["B", "A"]);
        assert_eq!(not_found, vec!["Ghost"]);
        assert_eq!(ed.selected_actors().len(), 2);

        ed.clear_selection();
        assert!(ed.selected_actors().is_empty());
    }

    #[test]
    fn delete_prunes_selection() {
        let (_dir, mut ed) = editor();
        ed.world.spawn(Actor::new("A", "PointLight")).unwrap();
        ed.set_selection(&["A".to_string()]);
        ed.delete_actor("A").unwrap();
        assert!(ed.selection.is_empty());
    }

    #[test]
    fn focus_on_missing_target_is_an_error() {
        let (_dir, mut ed) = editor();
        let err = ed.focus_on_target("Nobody", 1000.0).unwrap_err();
        assert_eq!(err, "Actor not found: Nobody");
    }

    #[test]
    fn open_level_saves_dirty_state_when_asked() {
        let (_dir, mut ed) = editor();
        ed.world.spawn(Actor::new("Keep", "CameraActor")).unwrap();
        ed.mark_dirty();
        ed.create_level("Annex", "maps", false).unwrap();

        // save_dirty=true persists the default level before switching.
        ed.open_level("Annex", true).unwrap();
        assert!(ed.world.is_empty());

        ed.open_level("Default", false).unwrap();
        assert_eq!(ed.world.actors()[0].name, "Keep");
    }

    #[test]
    fn create_level_can_open_immediately() {
        let (_dir, mut ed) = editor();
        ed.world.spawn(Actor::new("Old", "PointLight")).unwrap();
        let (path, opened) = ed.create_level("Fresh", "maps", true).unwrap();
        assert_eq!(path, "maps/Fresh");
        assert!(opened);
        assert!(ed.world.is_empty());
        assert_eq!(ed.levels.current_path(), "maps/Fresh");
    }

    #[test]
    fn save_all_is_noop_when_clean() {
        let (_dir, mut ed) = editor();
        assert!(ed.save_all_levels());
        ed.mark_dirty();
        assert!(ed.save_all_levels());
        assert!(!ed.levels.is_dirty());
    }
}
