//! Remote command bridge for the Forge editor.
//!
//! An AI assistant speaks JSON-RPC tool calls to the `forge-mcp` translator
//! over stdio; the translator relays bridge commands over one TCP connection
//! to the listener embedded in the editor process; the listener hands each
//! command through a single-slot execution gate to the editor's main loop,
//! where the dispatch table runs it against live host state. Errors are data
//! at every layer — nothing a client sends may crash the editor.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod gate;
pub mod listener;
pub mod protocol;
pub mod scripting;
pub mod translator;

pub use config::{BridgeConfig, TranslatorConfig};
pub use dispatch::{CommandRegistry, HostContext};
pub use error::BridgeError;
pub use gate::{execution_gate, GateClient, GateServer};
pub use listener::BridgeListener;
pub use protocol::Command;
