//! The tool surface exposed to the AI client, and the exec-snippet
//! convention the foundation tools are built on.
//!
//! Only `exec_editor_python` maps straight onto a bridge command. Every
//! other tool composes a fixed Lua snippet with that command: parameters are
//! injected through the implicit `MCP_PARAMS` global, and the snippet prints
//! a single `{status, result|error}` JSON object as its final output line,
//! which is scanned back out of the captured output here.

use serde_json::{json, Map, Value};

use super::connection::BridgeClient;

const SNIPPET_FOCUS_VIEWPORT: &str = include_str!("snippets/focus_viewport.lua");
const SNIPPET_TAKE_SCREENSHOT: &str = include_str!("snippets/take_screenshot.lua");
const SNIPPET_GET_SELECTED_ACTORS: &str = include_str!("snippets/get_selected_actors.lua");
const SNIPPET_SET_SELECTED_ACTORS: &str = include_str!("snippets/set_selected_actors.lua");
const SNIPPET_CLEAR_SELECTION: &str = include_str!("snippets/clear_selection.lua");
const SNIPPET_GET_CURRENT_LEVEL_INFO: &str = include_str!("snippets/get_current_level_info.lua");

const OUTPUT_PREVIEW_LIMIT: usize = 500;

pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "exec_editor_python",
            description: "Execute code in the Forge editor's embedded scripting engine. \
                PRIMARY TOOL: every other tool is a convenience wrapper over this one. \
                The code runs with full editor privileges; only use with trusted clients. \
                End with print(json.encode({status=\"success\", result={...}})) to return \
                structured data.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "code": { "type": "string", "description": "Code to execute in the editor" }
                },
                "required": ["code"]
            }),
        },
        ToolDef {
            name: "focus_viewport",
            description: "Focus the viewport on a named actor or an explicit location.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "target": { "type": "string", "description": "Actor name to focus on (takes precedence over location)" },
                    "location": { "type": "array", "items": { "type": "number" }, "description": "[X, Y, Z] to focus on when no target is given" },
                    "distance": { "type": "number", "description": "Camera distance from the target (default 1000)" },
                    "orientation": { "type": "array", "items": { "type": "number" }, "description": "Optional [Pitch, Yaw, Roll] for the camera" }
                }
            }),
        },
        ToolDef {
            name: "take_screenshot",
            description: "Capture the active viewport to a PNG file.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "filepath": { "type": "string", "description": "Destination path; .png is appended when missing" }
                },
                "required": ["filepath"]
            }),
        },
        ToolDef {
            name: "get_selected_actors",
            description: "Get the actors currently selected in the editor.",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDef {
            name: "set_selected_actors",
            description: "Replace the editor selection with the named actors. Reports which names were found and which were not.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "actor_names": { "type": "array", "items": { "type": "string" }, "description": "Actor names to select" }
                },
                "required": ["actor_names"]
            }),
        },
        ToolDef {
            name: "clear_selection",
            description: "Clear the editor selection.",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDef {
            name: "get_current_level_info",
            description: "Get the current level's path, actor count and dirty state.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "include_streaming": { "type": "boolean", "description": "Accepted for protocol compatibility; the host keeps a single persistent level" }
                }
            }),
        },
    ]
}

/// Run one tool call to completion. Always returns a canonical
/// `{status: "success"|"error", ...}` object; a tool call is never silently
/// dropped.
pub async fn call_tool(client: &mut BridgeClient, name: &str, args: &Map<String, Value>) -> Value {
    match name {
        "exec_editor_python" => exec_editor_python(client, args).await,
        "focus_viewport" => focus_viewport(client, args).await,
        "take_screenshot" => take_screenshot(client, args).await,
        "get_selected_actors" => exec_snippet(client, SNIPPET_GET_SELECTED_ACTORS, json!({})).await,
        "set_selected_actors" => set_selected_actors(client, args).await,
        "clear_selection" => exec_snippet(client, SNIPPET_CLEAR_SELECTION, json!({})).await,
        "get_current_level_info" => get_current_level_info(client, args).await,
        _ => error_status(format!("Unknown tool: {name}")),
    }
}

pub fn is_error(response: &Value) -> bool {
    response.get("status").and_then(Value::as_str) == Some("error")
}

async fn exec_editor_python(client: &mut BridgeClient, args: &Map<String, Value>) -> Value {
    let code = args.get("code").and_then(Value::as_str).unwrap_or("");
    if code.trim().is_empty() {
        return error_status("Script code cannot be empty");
    }
    match client
        .send_command("exec_editor_python", json!({ "code": code }))
        .await
    {
        Ok(response) => canonicalize(response),
        Err(e) => error_status(e.to_string()),
    }
}

async fn focus_viewport(client: &mut BridgeClient, args: &Map<String, Value>) -> Value {
    let target = args.get("target").and_then(Value::as_str);
    let location = match number_array(args, "location", 3) {
        Ok(v) => v,
        Err(e) => return error_status(e),
    };
    let orientation = match number_array(args, "orientation", 3) {
        Ok(v) => v,
        Err(e) => return error_status(e),
    };
    if target.is_none() && location.is_none() {
        return error_status("Either 'target' or 'location' must be provided");
    }

    // Absent keys are omitted entirely so the snippet sees plain nil.
    let mut params = Map::new();
    if let Some(target) = target {
        params.insert("target".into(), json!(target));
    }
    if let Some(location) = location {
        params.insert("location".into(), location);
    }
    params.insert(
        "distance".into(),
        args.get("distance")
            .and_then(Value::as_f64)
            .map(|d| json!(d))
            .unwrap_or(json!(1000.0)),
    );
    if let Some(orientation) = orientation {
        params.insert("orientation".into(), orientation);
    }
    exec_snippet(client, SNIPPET_FOCUS_VIEWPORT, Value::Object(params)).await
}

async fn take_screenshot(client: &mut BridgeClient, args: &Map<String, Value>) -> Value {
    let filepath = args.get("filepath").and_then(Value::as_str).unwrap_or("");
    if filepath.is_empty() {
        return error_status("Missing 'filepath' parameter");
    }
    exec_snippet(
        client,
        SNIPPET_TAKE_SCREENSHOT,
        json!({ "filepath": filepath }),
    )
    .await
}

async fn set_selected_actors(client: &mut BridgeClient, args: &Map<String, Value>) -> Value {
    let names: Option<Vec<&str>> = args
        .get("actor_names")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect());
    match names {
        Some(names) if !names.is_empty() => {
            exec_snippet(
                client,
                SNIPPET_SET_SELECTED_ACTORS,
                json!({ "actor_names": names }),
            )
            .await
        }
        _ => error_status("actor_names must be a non-empty list"),
    }
}

async fn get_current_level_info(client: &mut BridgeClient, args: &Map<String, Value>) -> Value {
    let include_streaming = args
        .get("include_streaming")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    exec_snippet(
        client,
        SNIPPET_GET_CURRENT_LEVEL_INFO,
        json!({ "include_streaming": include_streaming }),
    )
    .await
}

/// Execute a snippet with `MCP_PARAMS` injected, then lift the trailing JSON
/// object out of the captured output.
async fn exec_snippet(client: &mut BridgeClient, snippet: &str, params: Value) -> Value {
    let params_json = serde_json::to_string(&params).unwrap_or_else(|_| "{}".to_string());
    let code = format!(
        "MCP_PARAMS = json.decode({})\n\n{snippet}",
        lua_long_string(&params_json)
    );

    let response = match client
        .send_command("exec_editor_python", json!({ "code": code }))
        .await
    {
        Ok(response) => response,
        Err(e) => return error_status(e.to_string()),
    };
    let canonical = canonicalize(response);
    if is_error(&canonical) {
        return canonical;
    }

    let result = canonical.get("result").cloned().unwrap_or(json!({}));
    if result.get("success").and_then(Value::as_bool) != Some(true) {
        let mut message = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Script execution failed")
            .to_string();
        if let Some(extra) = result.get("error_output").and_then(Value::as_str) {
            if !extra.is_empty() {
                message = format!("{message}\n{extra}");
            }
        }
        return error_status(message);
    }

    let output = result.get("output").and_then(Value::as_str).unwrap_or("");
    match extract_last_json_line(output) {
        Some(parsed) => parsed,
        // Structured fallback, not a hard failure: the raw output is
        // preserved for debugging.
        None => json!({
            "status": "error",
            "error": "Snippet did not print a parseable JSON result",
            "details": { "output_preview": output_preview(output) },
        }),
    }
}

/// Scan captured output from the end for the last line that is a complete
/// JSON object carrying a `status` field.
pub fn extract_last_json_line(output: &str) -> Option<Value> {
    for line in output.lines().rev() {
        let line = line.trim();
        if !(line.starts_with('{') && line.ends_with('}')) {
            continue;
        }
        if let Ok(parsed) = serde_json::from_str::<Value>(line) {
            if parsed.get("status").is_some() {
                return Some(parsed);
            }
        }
    }
    None
}

/// Normalize every response shape the bridge has historically produced into
/// `{status: "success"|"error", result?|error?}`.
pub fn canonicalize(response: Value) -> Value {
    match response.get("status").and_then(Value::as_str) {
        Some("error") => {
            let mut canonical = json!({
                "status": "error",
                "error": error_message_of(&response),
            });
            if let Some(details) = response.get("details") {
                canonical["details"] = details.clone();
            }
            canonical
        }
        Some("success") => json!({
            "status": "success",
            "result": response.get("result").cloned().unwrap_or(json!({})),
        }),
        _ => {
            let failed = response.get("success") == Some(&Value::Bool(false))
                || response.get("error").is_some();
            if failed {
                json!({ "status": "error", "error": error_message_of(&response) })
            } else {
                // Legacy bare result: assume success.
                json!({ "status": "success", "result": response })
            }
        }
    }
}

fn error_message_of(response: &Value) -> String {
    response
        .get("error")
        .or_else(|| response.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown editor error")
        .to_string()
}

fn error_status(message: impl Into<String>) -> Value {
    json!({ "status": "error", "error": message.into() })
}

fn output_preview(output: &str) -> Value {
    if output.is_empty() {
        json!("No output")
    } else {
        json!(output.chars().take(OUTPUT_PREVIEW_LIMIT).collect::<String>())
    }
}

fn number_array(
    args: &Map<String, Value>,
    key: &str,
    len: usize,
) -> Result<Option<Value>, String> {
    let value = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let invalid = || format!("'{key}' must be an array of {len} numbers");
    let arr = value.as_array().ok_or_else(invalid)?;
    if arr.len() != len || !arr.iter().all(|v| v.is_number()) {
        return Err(invalid());
    }
    Ok(Some(value.clone()))
}

/// Wrap text in a Lua long-bracket string, escalating the bracket level past
/// any closer the text itself contains.
fn lua_long_string(text: &str) -> String {
    let mut level = 2;
    while text.contains(&format!("]{}]", "=".repeat(level))) {
        level += 1;
    }
    let eq = "=".repeat(level);
    format!("[{eq}[{text}]{eq}]")
}
