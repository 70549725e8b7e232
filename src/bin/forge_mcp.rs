//! MCP stdio translator: exposes the bridge as tool calls for an AI client.
//!
//! stdout is reserved for protocol frames; logs go to stderr.

use tracing_subscriber::EnvFilter;

use forge_bridge::translator::McpServer;
use forge_bridge::TranslatorConfig;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = TranslatorConfig::from_env();
    McpServer::new(config).run().await
}
