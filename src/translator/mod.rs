//! The protocol translator: a JSON-RPC 2.0 tool-call surface over stdio,
//! backed by one TCP connection to the bridge listener.
//!
//! Tool calls may overlap on the client side; their network legs are
//! serialized through a FIFO lock on the single connection, and each reply is
//! correlated back to its original request id independently, in whatever
//! order the underlying commands complete. stdout carries protocol frames
//! only; logging goes to stderr.

pub mod connection;
pub mod tools;

pub use connection::BridgeClient;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::config::TranslatorConfig;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: String,
    #[serde(default)]
    params: Value,
}

pub struct McpServer {
    client: Arc<Mutex<BridgeClient>>,
}

impl McpServer {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            client: Arc::new(Mutex::new(BridgeClient::new(config))),
        }
    }

    /// Serve until stdin closes. The process does not daemonize itself.
    pub async fn run(self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        // One writer task owns stdout; concurrent tool calls funnel their
        // replies through it in completion order.
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = out_rx.recv().await {
                if stdout.write_all(line.as_bytes()).await.is_err()
                    || stdout.write_all(b"\n").await.is_err()
                    || stdout.flush().await.is_err()
                {
                    break;
                }
            }
        });

        info!("[Forge mcp] stdio server started");
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            self.handle_line(&line, &out_tx);
        }
        drop(out_tx);
        let _ = writer.await;
        info!("[Forge mcp] stdio server stopped");
        Ok(())
    }

    fn handle_line(&self, line: &str, out: &mpsc::UnboundedSender<String>) {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                let _ = out.send(error_frame(Value::Null, -32700, &format!("Parse error: {e}")));
                return;
            }
        };
        let JsonRpcRequest { id, method, params } = request;

        match method.as_str() {
            "initialize" => respond(out, id, initialize_result()),
            "notifications/initialized" | "notifications/cancelled" => {}
            "ping" => respond(out, id, json!({})),
            "tools/list" => respond(out, id, tools_list_result()),
            "tools/call" => {
                // A call without an id is unanswerable; nothing to do.
                let Some(id) = id else { return };
                let client = Arc::clone(&self.client);
                let out = out.clone();
                tokio::spawn(async move {
                    let name = params
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    let args = params
                        .get("arguments")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default();
                    let response = {
                        let mut client = client.lock().await;
                        tools::call_tool(&mut client, &name, &args).await
                    };
                    let _ = out.send(result_frame(id, tool_call_result(&response)));
                });
            }
            _ => {
                if let Some(id) = id {
                    warn!("[Forge mcp] Unknown method: {method}");
                    let _ =
                        out.send(error_frame(id, -32601, &format!("Method not found: {method}")));
                }
            }
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": "forge-mcp",
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

fn tools_list_result() -> Value {
    let tools: Vec<Value> = tools::tool_definitions()
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema,
            })
        })
        .collect();
    json!({ "tools": tools })
}

/// Wrap a canonical tool response as MCP content blocks.
fn tool_call_result(response: &Value) -> Value {
    let text = serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
    let mut result = json!({ "content": [{ "type": "text", "text": text }] });
    if tools::is_error(response) {
        result["isError"] = json!(true);
    }
    result
}

fn respond(out: &mpsc::UnboundedSender<String>, id: Option<Value>, result: Value) {
    if let Some(id) = id {
        let _ = out.send(result_frame(id, result));
    }
}

fn result_frame(id: Value, result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string()
}

fn error_frame(id: Value, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
    .to_string()
}
