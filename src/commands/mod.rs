//! Foundation command handlers.
//!
//! Everything here is convenience: each handler wraps a query or mutation
//! that could equivalently be expressed as a script through the generic
//! exec command.

mod actors;
mod exec;
mod levels;
mod viewport;

use serde_json::json;

use crate::dispatch::CommandRegistry;

pub fn register_builtin(registry: &mut CommandRegistry) {
    registry.register("ping", |_ctx, _params| Ok(json!({ "message": "pong" })));

    actors::register(registry);
    viewport::register(registry);
    levels::register(registry);
    exec::register(registry);
}
