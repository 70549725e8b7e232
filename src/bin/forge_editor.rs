//! Headless reference editor host embedding the bridge.
//!
//! Runs the editor's main loop at a fixed tick; the bridge listener lives on
//! its own I/O thread and every command is serviced here, between ticks.

use std::thread;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use forge_bridge::{execution_gate, BridgeConfig, BridgeListener, CommandRegistry, HostContext};

const TICK: Duration = Duration::from_millis(16);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = BridgeConfig::from_env();
    let mut ctx = HostContext::with_lua(config.content_dir.clone());
    let registry = CommandRegistry::with_builtin_commands();

    let (gate, server) = execution_gate();
    let listener = BridgeListener::start(&config, gate).expect("Failed to start bridge listener");
    info!(
        "[Forge editor] Ready on {} (content dir: {})",
        listener.local_addr(),
        config.content_dir.display()
    );

    loop {
        server.pump(&mut ctx, &registry);
        thread::sleep(TICK);
    }
}
