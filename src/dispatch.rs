//! Typed command dispatch: a registry from command-type strings to handlers.
//!
//! Handlers read their parameters out of the untyped bag, validate them at
//! the boundary, and do one logical unit of host-state work. Dispatch itself
//! is a pure lookup-and-invoke; unknown types fail without side effects.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::editor::EditorState;
use crate::protocol::Command;
use crate::scripting::ScriptEngine;

/// Everything a handler may touch, passed explicitly. The editor state and
/// the scripting engine are separate fields so the exec command can borrow
/// both at once.
pub struct HostContext {
    pub editor: EditorState,
    pub script: Box<dyn ScriptEngine>,
}

impl HostContext {
    pub fn new(editor: EditorState, script: Box<dyn ScriptEngine>) -> Self {
        Self { editor, script }
    }

    /// Reference host wired to the embedded Lua engine.
    pub fn with_lua(content_dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(
            EditorState::new(content_dir),
            Box::new(crate::scripting::LuaEngine::new()),
        )
    }
}

pub type Handler = Box<dyn Fn(&mut HostContext, &Map<String, Value>) -> Result<Value, String> + Send>;

#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the full foundation command set.
    pub fn with_builtin_commands() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtin(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, command_type: impl Into<String>, handler: F)
    where
        F: Fn(&mut HostContext, &Map<String, Value>) -> Result<Value, String> + Send + 'static,
    {
        self.handlers.insert(command_type.into(), Box::new(handler));
    }

    pub fn contains(&self, command_type: &str) -> bool {
        self.handlers.contains_key(command_type)
    }

    pub fn command_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn dispatch(&self, ctx: &mut HostContext, command: &Command) -> Result<Value, String> {
        match self.handlers.get(&command.command_type) {
            Some(handler) => handler(ctx, &command.params),
            None => Err(format!("Unknown command: {}", command.command_type)),
        }
    }
}

// --- parameter coercion helpers, shared by all handlers ---

/// A required string. A present-but-mistyped value reads as missing, the
/// behavior clients of the original protocol rely on.
pub fn require_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing '{key}' parameter"))
}

pub fn require_value<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    params
        .get(key)
        .ok_or_else(|| format!("Missing '{key}' parameter"))
}

pub fn opt_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub fn opt_f64(params: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("Invalid '{key}' parameter: expected a number")),
    }
}

pub fn opt_bool(params: &Map<String, Value>, key: &str) -> Result<Option<bool>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| format!("Invalid '{key}' parameter: expected a boolean")),
    }
}

/// An optional `[x, y, z]` triple of numbers.
pub fn opt_vec3(params: &Map<String, Value>, key: &str) -> Result<Option<[f64; 3]>, String> {
    let value = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let invalid = || format!("Invalid '{key}' parameter: expected an array of 3 numbers");
    let arr = value.as_array().ok_or_else(invalid)?;
    if arr.len() != 3 {
        return Err(invalid());
    }
    let mut out = [0.0; 3];
    for (slot, item) in out.iter_mut().zip(arr) {
        *slot = item.as_f64().ok_or_else(invalid)?;
    }
    Ok(Some(out))
}

pub fn opt_str_list(params: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>, String> {
    let value = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let invalid = || format!("Invalid '{key}' parameter: expected an array of strings");
    let arr = value.as_array().ok_or_else(invalid)?;
    arr.iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn unknown_command_is_a_pure_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = HostContext::with_lua(dir.path());
        let registry = CommandRegistry::with_builtin_commands();

        let cmd = Command::new("warp_reality", Map::new());
        let err = registry.dispatch(&mut ctx, &cmd).unwrap_err();
        assert_eq!(err, "Unknown command: warp_reality");
        assert!(ctx.editor.world.is_empty());
    }

    #[test]
    fn mistyped_required_string_reads_as_missing() {
        let p = params(json!({"pattern": 42}));
        assert_eq!(
            require_str(&p, "pattern").unwrap_err(),
            "Missing 'pattern' parameter"
        );
    }

    #[test]
    fn vec3_accepts_triples_and_rejects_everything_else() {
        let p = params(json!({"good": [1, 2.5, -3], "short": [1, 2], "mixed": [1, "a", 3]}));
        assert_eq!(opt_vec3(&p, "good").unwrap(), Some([1.0, 2.5, -3.0]));
        assert_eq!(opt_vec3(&p, "absent").unwrap(), None);
        assert!(opt_vec3(&p, "short").is_err());
        assert!(opt_vec3(&p, "mixed").is_err());
    }

    #[test]
    fn registry_lists_builtin_command_types() {
        let registry = CommandRegistry::with_builtin_commands();
        for expected in [
            "ping",
            "get_actors_in_level",
            "find_actors_by_name",
            "spawn_actor",
            "create_actor",
            "delete_actor",
            "set_actor_transform",
            "get_actor_properties",
            "set_actor_property",
            "focus_viewport",
            "take_screenshot",
            "create_level",
            "open_level",
            "save_current_level",
            "save_all_levels",
            "get_current_level_info",
            "exec_editor_python",
        ] {
            assert!(registry.contains(expected), "missing {expected}");
        }
    }
}
