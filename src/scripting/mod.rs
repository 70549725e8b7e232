//! Embedded scripting for the reference editor host.
//!
//! The bridge depends only on the [`ScriptEngine`] contract: run a piece of
//! code against the editor, capture everything it printed, report success or
//! failure. The shipped engine is Lua (see [`lua`]); a real host can plug in
//! whatever its embedded interpreter is.

pub mod lua;

pub use lua::LuaEngine;

use crate::editor::EditorState;

pub const DEFAULT_SCRIPT_BUDGET_MS: u64 = 5000;
pub const DEFAULT_SCRIPT_HOOK_INSTRUCTION_INTERVAL: u32 = 10_000;

/// Outcome of one script execution.
#[derive(Debug, Clone, Default)]
pub struct ExecRecord {
    pub success: bool,
    /// Everything the script printed, in order.
    pub output: String,
    /// Engine-reported failure message, when `success` is false.
    pub error: Option<String>,
}

impl ExecRecord {
    pub fn failure(error: impl Into<String>, output: String) -> Self {
        Self {
            success: false,
            output,
            error: Some(error.into()),
        }
    }
}

/// "Run code, capture output, report success" — the only primitive the
/// generic exec command needs from the host.
pub trait ScriptEngine: Send {
    fn exec(&mut self, code: &str, editor: &mut EditorState) -> ExecRecord;
}
