//! Lua implementation of the editor's embedded scripting engine.
//!
//! Each exec runs in a fresh interpreter with three globals:
//! - `print(...)` — captured into the output buffer instead of stdout;
//! - `json.encode` / `json.decode` — serde-backed, so scripts can emit the
//!   trailing-JSON result line the bridge convention expects;
//! - `editor.*` — a scoped API table borrowing the live editor state for the
//!   duration of the call.
//!
//! A wall-clock budget enforced through an instruction hook keeps a runaway
//! script from stalling the host tick loop forever.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use mlua::{HookTriggers, Lua, LuaSerdeExt, MultiValue, Value as LuaValue, VmState};
use tracing::debug;

use super::{ExecRecord, ScriptEngine, DEFAULT_SCRIPT_BUDGET_MS,
    DEFAULT_SCRIPT_HOOK_INSTRUCTION_INTERVAL};
use crate::editor::EditorState;

pub struct LuaEngine {
    budget: Duration,
}

impl Default for LuaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LuaEngine {
    pub fn new() -> Self {
        Self {
            budget: Duration::from_millis(env_u64(
                "FORGE_SCRIPT_BUDGET_MS",
                DEFAULT_SCRIPT_BUDGET_MS,
            )),
        }
    }

    pub fn with_budget(budget: Duration) -> Self {
        Self { budget }
    }
}

impl ScriptEngine for LuaEngine {
    fn exec(&mut self, code: &str, editor: &mut EditorState) -> ExecRecord {
        let lua = Lua::new();
        let output = Rc::new(RefCell::new(String::new()));

        if let Err(e) = install_print(&lua, output.clone()) {
            return ExecRecord::failure(format!("Failed to set up interpreter: {e}"), String::new());
        }
        if let Err(e) = install_json(&lua) {
            return ExecRecord::failure(format!("Failed to set up interpreter: {e}"), String::new());
        }

        let budget = self.budget;
        let start = Instant::now();
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(DEFAULT_SCRIPT_HOOK_INSTRUCTION_INTERVAL),
            move |_lua, _debug| {
                if start.elapsed() >= budget {
                    return Err(mlua::Error::RuntimeError(format!(
                        "Script execution budget exceeded ({}ms)",
                        budget.as_millis()
                    )));
                }
                Ok(VmState::Continue)
            },
        );

        let editor_cell = RefCell::new(editor);
        let result = lua.scope(|scope| {
            let api = lua.create_table()?;

            api.set(
                "get_all_actors",
                scope.create_function(|lua, ()| {
                    let ed = editor_cell.borrow();
                    let actors: Vec<serde_json::Value> =
                        ed.world.actors().iter().map(|a| a.to_json(false)).collect();
                    lua.to_value(&actors)
                })?,
            )?;

            api.set(
                "get_selected_actors",
                scope.create_function(|lua, ()| {
                    let ed = editor_cell.borrow();
                    let actors: Vec<serde_json::Value> =
                        ed.selected_actors().iter().map(|a| a.to_json(false)).collect();
                    lua.to_value(&actors)
                })?,
            )?;

            api.set(
                "set_selected_actors",
                scope.create_function(|lua, names: Vec<String>| {
                    let mut ed = editor_cell.borrow_mut();
                    let (found, not_found) = ed.set_selection(&names);
                    lua.to_value(&serde_json::json!({
                        "selected_count": found.len(),
                        "found": found,
                        "not_found": not_found,
                    }))
                })?,
            )?;

            api.set(
                "clear_selection",
                scope.create_function(|_, ()| {
                    editor_cell.borrow_mut().clear_selection();
                    Ok(())
                })?,
            )?;

            api.set(
                "set_view_location",
                scope.create_function(|lua, location: LuaValue| {
                    let location: [f64; 3] = lua.from_value(location)?;
                    editor_cell.borrow_mut().viewport.location = location;
                    Ok(())
                })?,
            )?;

            api.set(
                "set_view_rotation",
                scope.create_function(|lua, rotation: LuaValue| {
                    let rotation: [f64; 3] = lua.from_value(rotation)?;
                    editor_cell.borrow_mut().viewport.set_rotation(rotation);
                    Ok(())
                })?,
            )?;

            api.set(
                "take_screenshot",
                scope.create_function(|_, filepath: String| {
                    editor_cell
                        .borrow()
                        .take_screenshot(&filepath)
                        .map_err(mlua::Error::RuntimeError)
                })?,
            )?;

            api.set(
                "level_info",
                scope.create_function(|lua, ()| {
                    let info = editor_cell.borrow().level_info();
                    lua.to_value(&info)
                })?,
            )?;

            lua.globals().set("editor", api)?;
            lua.load(code).set_name("exec").exec()
        });

        let output = output.borrow().clone();
        match result {
            Ok(()) => ExecRecord {
                success: true,
                output,
                error: None,
            },
            Err(e) => {
                let message = e.to_string();
                debug!("[Forge scripts] exec failed: {message}");
                ExecRecord::failure(message, output)
            }
        }
    }
}

fn install_print(lua: &Lua, output: Rc<RefCell<String>>) -> mlua::Result<()> {
    let print = lua.create_function(move |lua, args: MultiValue| {
        let mut line = String::new();
        for (i, value) in args.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            match lua.coerce_string(value.clone())? {
                Some(s) => line.push_str(&s.to_string_lossy()),
                None => line.push_str(&format!("{value:?}")),
            }
        }
        let mut buf = output.borrow_mut();
        buf.push_str(&line);
        buf.push('\n');
        Ok(())
    })?;
    lua.globals().set("print", print)
}

fn install_json(lua: &Lua) -> mlua::Result<()> {
    let json = lua.create_table()?;
    json.set(
        "encode",
        // mlua's serializer handles Lua values directly and respects the
        // array metatable, so empty arrays stay arrays.
        lua.create_function(|_, value: LuaValue| {
            serde_json::to_string(&value).map_err(mlua::Error::external)
        })?,
    )?;
    json.set(
        "decode",
        lua.create_function(|lua, text: mlua::String| {
            let value: serde_json::Value =
                serde_json::from_str(&text.to_string_lossy()).map_err(mlua::Error::external)?;
            lua.to_value(&value)
        })?,
    )?;
    json.set("array_mt", lua.array_metatable())?;
    lua.globals().set("json", json)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::world::Actor;

    fn editor() -> (tempfile::TempDir, EditorState) {
        let dir = tempfile::tempdir().unwrap();
        let state = EditorState::new(dir.path());
        (dir, state)
    }

    #[test]
    fn print_is_captured_in_order() {
        let (_dir, mut ed) = editor();
        let mut engine = LuaEngine::new();
        let record = engine.exec("print('one')\nprint('two', 3)", &mut ed);
        assert!(record.success);
        assert_eq!(record.output, "one\ntwo\t3\n");
    }

    #[test]
    fn json_module_roundtrips() {
        let (_dir, mut ed) = editor();
        let mut engine = LuaEngine::new();
        let record = engine.exec(
            "local t = json.decode('{\"a\": [1, 2, 3]}')\nprint(json.encode({status = \"success\", first = t.a[1]}))",
            &mut ed,
        );
        assert!(record.success, "error: {:?}", record.error);
        let parsed: serde_json::Value =
            serde_json::from_str(record.output.trim()).expect("last line is JSON");
        assert_eq!(parsed["status"], "success");
        assert_eq!(parsed["first"].as_f64(), Some(1.0));
    }

    #[test]
    fn editor_api_sees_live_world() {
        let (_dir, mut ed) = editor();
        ed.world.spawn(Actor::new("Cube_1", "StaticMeshActor")).unwrap();
        ed.world.spawn(Actor::new("Lamp", "PointLight")).unwrap();

        let mut engine = LuaEngine::new();
        let record = engine.exec(
            "local actors = editor.get_all_actors()\nprint(#actors, actors[2].name)",
            &mut ed,
        );
        assert!(record.success, "error: {:?}", record.error);
        assert_eq!(record.output.trim(), "2\tLamp");
    }

    #[test]
    fn editor_api_mutations_persist_after_exec() {
        let (_dir, mut ed) = editor();
        ed.world.spawn(Actor::new("Cube_1", "StaticMeshActor")).unwrap();

        let mut engine = LuaEngine::new();
        let record = engine.exec(
            "local r = editor.set_selected_actors({'Cube_1', 'Ghost'})\nprint(r.selected_count, r.not_found[1])\neditor.set_view_location({10, 20, 30})",
            &mut ed,
        );
        assert!(record.success, "error: {:?}", record.error);
        assert_eq!(record.output.trim(), "1\tGhost");
        assert_eq!(ed.selection, vec!["Cube_1"]);
        assert_eq!(ed.viewport.location, [10.0, 20.0, 30.0]);
    }

    #[test]
    fn runtime_error_reports_failure_and_keeps_output() {
        let (_dir, mut ed) = editor();
        let mut engine = LuaEngine::new();
        let record = engine.exec("print('before')\nerror('boom')", &mut ed);
        assert!(!record.success);
        assert!(record.error.as_deref().unwrap().contains("boom"));
        assert_eq!(record.output, "before\n");
    }

    #[test]
    fn runaway_script_hits_budget() {
        let (_dir, mut ed) = editor();
        let mut engine = LuaEngine::with_budget(Duration::from_millis(50));
        let started = Instant::now();
        let record = engine.exec("while true do end", &mut ed);
        assert!(!record.success);
        assert!(record.error.as_deref().unwrap().contains("budget"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
