//! Error taxonomy for the transport layers.
//!
//! Handler-level failures stay `Result<_, String>` (errors are data on the
//! wire); this type covers the seams where the transport itself fails.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The execution gate did not produce a result before the deadline. The
    /// underlying work may still complete; its late result is discarded.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// The host side of the gate is gone (editor shutting down).
    #[error("Execution gate is closed")]
    GateClosed,

    /// Could not reach the editor after the bounded number of attempts.
    #[error("Failed to connect to Forge editor at {addr} after {attempts} attempt(s)")]
    Unreachable { addr: std::net::SocketAddr, attempts: u32 },

    /// The connection dropped mid-exchange.
    #[error("Connection to Forge editor lost: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent something that is not a valid frame.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl BridgeError {
    /// Timeouts are retryable: the caller may re-issue the command once the
    /// host catches up. Connection and protocol faults need intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Timeout(_))
    }
}
