//! Level management commands.

use serde_json::{json, Map, Value};

use crate::dispatch::{opt_bool, opt_str, require_str, CommandRegistry, HostContext};
use crate::editor::levels::DEFAULT_FOLDER;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("create_level", create_level);
    registry.register("open_level", open_level);
    registry.register("save_current_level", save_current_level);
    registry.register("save_all_levels", save_all_levels);
    registry.register("get_current_level_info", get_current_level_info);
}

fn create_level(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let level_name = require_str(params, "level_name")?.to_string();
    let folder = opt_str(params, "folder").unwrap_or(DEFAULT_FOLDER).to_string();
    let open_after_create = opt_bool(params, "open_after_create")?.unwrap_or(true);

    let (level_path, opened) = ctx
        .editor
        .create_level(&level_name, &folder, open_after_create)?;
    Ok(json!({
        "level_path": level_path,
        "level_name": level_name,
        "opened": opened,
    }))
}

fn open_level(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let level = require_str(params, "level")?;
    let save_dirty = opt_bool(params, "save_dirty")?.unwrap_or(true);
    let level_path = ctx.editor.open_level(level, save_dirty)?;
    Ok(json!({ "level_path": level_path, "success": true }))
}

fn save_current_level(ctx: &mut HostContext, _params: &Map<String, Value>) -> Result<Value, String> {
    let level_path = ctx.editor.save_current_level()?;
    Ok(json!({ "level_path": level_path, "success": true }))
}

fn save_all_levels(ctx: &mut HostContext, _params: &Map<String, Value>) -> Result<Value, String> {
    Ok(json!({ "success": ctx.editor.save_all_levels() }))
}

fn get_current_level_info(
    ctx: &mut HostContext,
    _params: &Map<String, Value>,
) -> Result<Value, String> {
    Ok(ctx.editor.level_info())
}
