//! The generic exec command — the primary extension point.
//!
//! The command name is `exec_editor_python` for wire compatibility with
//! existing clients of the protocol; the code runs in whatever engine the
//! host embeds (Lua here). The handler's contract is raw: code in, captured
//! output plus a success flag out. Structured results are a convention the
//! translator layers on top (a trailing JSON line scanned out of the output).

use serde_json::{json, Map, Value};

use crate::dispatch::{require_str, CommandRegistry, HostContext};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("exec_editor_python", exec_editor_script);
}

fn exec_editor_script(ctx: &mut HostContext, params: &Map<String, Value>) -> Result<Value, String> {
    let code = require_str(params, "code")?;
    if code.trim().is_empty() {
        return Err("Script code cannot be empty".to_string());
    }

    let HostContext { editor, script } = ctx;
    let record = script.exec(code, editor);

    if record.success {
        Ok(json!({ "success": true, "output": record.output }))
    } else {
        let mut result = json!({
            "success": false,
            "error": record
                .error
                .unwrap_or_else(|| "Script execution failed".to_string()),
        });
        if !record.output.is_empty() {
            result["output"] = Value::String(record.output);
        }
        Ok(result)
    }
}
