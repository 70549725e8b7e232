//! Environment-driven configuration for the bridge and the translator.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default bridge port. Loopback only; the wire protocol carries no
/// authentication and must not be exposed beyond trusted networks.
pub const DEFAULT_PORT: u16 = 55557;

const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SOCKET_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_ATTEMPTS: u64 = 3;

/// Listener-side configuration, read from the environment by the editor
/// process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub bind_addr: SocketAddr,
    /// How long the network thread waits for the host thread to service a
    /// command before reporting a timeout to the client.
    pub exec_timeout: Duration,
    /// Root for persisted levels and screenshots.
    pub content_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            exec_timeout: Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS),
            content_dir: PathBuf::from("content"),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        let port = env_u64("FORGE_BRIDGE_PORT", u64::from(DEFAULT_PORT)) as u16;
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
            exec_timeout: Duration::from_secs(env_u64(
                "FORGE_BRIDGE_EXEC_TIMEOUT_SECS",
                DEFAULT_EXEC_TIMEOUT_SECS,
            )),
            content_dir: PathBuf::from(env_string("FORGE_CONTENT_DIR", "content")),
        }
    }
}

/// Translator-side configuration (`forge-mcp`).
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub editor_addr: SocketAddr,
    /// Deadline for one framed request/response exchange over TCP.
    pub socket_timeout: Duration,
    /// Bounded reconnect attempts before surfacing a connection error.
    pub connect_attempts: u32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            editor_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            socket_timeout: Duration::from_secs(DEFAULT_SOCKET_TIMEOUT_SECS),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS as u32,
        }
    }
}

impl TranslatorConfig {
    pub fn from_env() -> Self {
        let port = env_u64("FORGE_BRIDGE_PORT", u64::from(DEFAULT_PORT)) as u16;
        Self {
            editor_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
            socket_timeout: Duration::from_secs(env_u64(
                "FORGE_MCP_SOCKET_TIMEOUT_SECS",
                DEFAULT_SOCKET_TIMEOUT_SECS,
            )),
            connect_attempts: env_u64("FORGE_MCP_CONNECT_ATTEMPTS", DEFAULT_CONNECT_ATTEMPTS)
                .max(1) as u32,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
