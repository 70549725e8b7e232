//! Viewport commands: focus and screenshot capture.

use serde_json::{json, Map, Value};

use crate::dispatch::{opt_f64, opt_str, opt_vec3, require_str, CommandRegistry, HostContext};

const DEFAULT_FOCUS_DISTANCE: f64 = 1000.0;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("focus_viewport", focus_viewport);
    registry.register("take_screenshot", take_screenshot);
}

fn focus_viewport(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let target = opt_str(params, "target");
    let location = opt_vec3(params, "location")?;
    let distance = opt_f64(params, "distance")?.unwrap_or(DEFAULT_FOCUS_DISTANCE);
    let orientation = opt_vec3(params, "orientation")?;

    if let Some(target) = target {
        ctx.editor.focus_on_target(target, distance)?;
    } else if let Some(location) = location {
        ctx.editor.viewport.focus(location, distance);
    } else {
        return Err("Either 'target' or 'location' must be provided".to_string());
    }

    if let Some(orientation) = orientation {
        ctx.editor.viewport.set_rotation(orientation);
    }

    Ok(json!({ "success": true }))
}

fn take_screenshot(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let filepath = require_str(params, "filepath")?;
    let written = ctx.editor.take_screenshot(filepath)?;
    Ok(json!({ "filepath": written }))
}
