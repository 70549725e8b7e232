//! TCP client side of the bridge wire protocol.
//!
//! One persistent connection, opened lazily and re-opened after drops with a
//! bounded number of attempts. Correlation on this leg is positional, so any
//! failed exchange (including a timeout) tears the connection down — a late
//! response arriving on a reused socket would be matched to the wrong
//! command.

use std::io;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::TranslatorConfig;
use crate::error::BridgeError;
use crate::protocol::{decode_frame, encode_frame};

const RECONNECT_DELAY: Duration = Duration::from_millis(250);

struct Conn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

pub struct BridgeClient {
    config: TranslatorConfig,
    conn: Option<Conn>,
}

impl BridgeClient {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config, conn: None }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn disconnect(&mut self) {
        self.conn = None;
    }

    /// Send one command and wait for its framed response.
    ///
    /// A command is never silently dropped: every failure surfaces as an
    /// error. It is also never re-sent after a successful write — the editor
    /// may have committed the mutation even if the response was lost.
    pub async fn send_command(
        &mut self,
        command_type: &str,
        params: Value,
    ) -> Result<Value, BridgeError> {
        self.ensure_connected().await?;
        let frame = encode_frame(&json!({ "type": command_type, "params": params }));
        let timeout = self.config.socket_timeout;
        let conn = self.conn.as_mut().expect("connection was just established");

        let exchange: Result<Value, BridgeError> = async {
            conn.writer.write_all(&frame).await?;
            conn.writer.flush().await?;

            let mut line = String::new();
            let read = tokio::time::timeout(timeout, conn.reader.read_line(&mut line))
                .await
                .map_err(|_| BridgeError::Timeout(timeout))??;
            if read == 0 {
                return Err(BridgeError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by editor",
                )));
            }
            decode_frame(&line).map_err(BridgeError::Protocol)
        }
        .await;

        if exchange.is_err() {
            self.conn = None;
        }
        exchange
    }

    async fn ensure_connected(&mut self) -> Result<(), BridgeError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let addr = self.config.editor_addr;
        let attempts = self.config.connect_attempts.max(1);
        for attempt in 1..=attempts {
            info!("[Forge mcp] Connecting to editor at {addr} (attempt {attempt}/{attempts})");
            match tokio::time::timeout(self.config.socket_timeout, TcpStream::connect(addr)).await
            {
                Ok(Ok(stream)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("[Forge mcp] Failed to set TCP_NODELAY: {e}");
                    }
                    let (read_half, write_half) = stream.into_split();
                    self.conn = Some(Conn {
                        reader: BufReader::new(read_half),
                        writer: write_half,
                    });
                    info!("[Forge mcp] Connected to editor");
                    return Ok(());
                }
                Ok(Err(e)) => warn!("[Forge mcp] Connection attempt {attempt} failed: {e}"),
                Err(_) => warn!("[Forge mcp] Connection attempt {attempt} timed out"),
            }
            if attempt < attempts {
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
        Err(BridgeError::Unreachable { addr, attempts })
    }
}
