//! TCP command listener: the network-facing half of the bridge.
//!
//! Runs on a dedicated I/O thread with its own runtime (the host thread
//! belongs to the editor). Single-tenant: one live connection at a time, and
//! later connection attempts queue behind the sequential accept loop. Per
//! frame: decode, hand to the execution gate, write the framed result back
//! before reading the next frame — no pipelining.

use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::gate::GateClient;
use crate::protocol::{decode_frame, encode_frame, error_response, Command};

pub struct BridgeListener {
    local_addr: SocketAddr,
    _thread: thread::JoinHandle<()>,
}

impl BridgeListener {
    /// Bind and start serving on a background thread. Binding happens
    /// synchronously so the caller (and tests binding port 0) learn the
    /// actual address before any client can race the listener.
    pub fn start(config: &BridgeConfig, gate: GateClient) -> std::io::Result<Self> {
        let std_listener = std::net::TcpListener::bind(config.bind_addr)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;
        let exec_timeout = config.exec_timeout;

        let thread = thread::Builder::new()
            .name("forge-bridge-listener".into())
            .spawn(move || {
                let rt = tokio::runtime::Runtime::new().expect("Failed to start bridge runtime");
                rt.block_on(async move {
                    let listener = TcpListener::from_std(std_listener)
                        .expect("Failed to adopt bridge socket");
                    info!("[Forge bridge] Listening on {local_addr}");
                    serve(listener, gate, exec_timeout).await;
                });
            })?;

        Ok(Self {
            local_addr,
            _thread: thread,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

async fn serve(listener: TcpListener, gate: GateClient, exec_timeout: Duration) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("[Forge bridge] Client connected from {peer}");
                match handle_connection(stream, &gate, exec_timeout).await {
                    Ok(()) => info!("[Forge bridge] Client disconnected"),
                    Err(e) => debug!("[Forge bridge] Connection ended: {e}"),
                }
            }
            Err(e) => {
                warn!("[Forge bridge] Accept failed: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    gate: &GateClient,
    exec_timeout: Duration,
) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = respond(&line, gate, exec_timeout).await;
        // If the client vanished, the host-side work (if any) has already
        // committed; the undelivered response is an accepted loss.
        write_half.write_all(&encode_frame(&response)).await?;
        write_half.flush().await?;
    }
    Ok(())
}

/// One message in, one message out. Every failure mode is data.
async fn respond(line: &str, gate: &GateClient, exec_timeout: Duration) -> Value {
    let value = match decode_frame(line) {
        Ok(value) => value,
        Err(e) => return error_response(e),
    };
    let command = match Command::from_value(value) {
        Ok(command) => command,
        Err(e) => return error_response(e),
    };

    let command_type = command.command_type.clone();
    match gate.submit(command, exec_timeout).await {
        Ok(result) => result,
        Err(BridgeError::Timeout(d)) => error_response(format!(
            "Command '{command_type}' timed out after {d:?}; the editor may still be working"
        )),
        Err(e) => error_response(format!("Command '{command_type}' was not executed: {e}")),
    }
}
