//! Cross-thread execution gate: the single-slot handoff between the network
//! thread and the host's main loop.
//!
//! The host's state is only safe to touch from its own thread, so the
//! network side never dispatches directly. It places the command in the one
//! execution slot (a bounded channel of capacity 1) and blocks, with a
//! deadline, on a completion signal. The host drains the slot on its next
//! tick, runs the handler synchronously, and answers through the signal. A
//! second command arriving while the slot is occupied waits its turn; nothing
//! is ever overwritten.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::dispatch::{CommandRegistry, HostContext};
use crate::error::BridgeError;
use crate::protocol::{error_response, Command};

/// One in-flight unit of work: the command, and the signal its result travels
/// back on. Dropping the receiver abandons the slot; a late completion then
/// fails to send and is discarded rather than leaking into a later command.
pub struct ExecutionSlot {
    pub command: Command,
    responder: oneshot::Sender<Value>,
}

/// Create a connected gate: the client half lives on the network thread, the
/// server half on the host thread.
pub fn execution_gate() -> (GateClient, GateServer) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (GateClient { tx }, GateServer { rx })
}

#[derive(Clone)]
pub struct GateClient {
    tx: Sender<ExecutionSlot>,
}

impl GateClient {
    /// Hand a command to the host thread and wait for its result.
    ///
    /// The deadline bounds each leg of the wait (queueing for the slot, then
    /// execution). On timeout the caller gets a retryable error; host-side
    /// execution is not cancelled and already-committed mutations stand.
    pub async fn submit(&self, command: Command, timeout: Duration) -> Result<Value, BridgeError> {
        let (done_tx, done_rx) = oneshot::channel();
        let slot = ExecutionSlot {
            command,
            responder: done_tx,
        };

        // The bounded send can block while an earlier slot is serviced, so it
        // runs off the async worker.
        let tx = self.tx.clone();
        let queued = tokio::task::spawn_blocking(move || tx.send_timeout(slot, timeout))
            .await
            .map_err(|_| BridgeError::GateClosed)?;
        match queued {
            Ok(()) => {}
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => {
                return Err(BridgeError::Timeout(timeout))
            }
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                return Err(BridgeError::GateClosed)
            }
        }

        match tokio::time::timeout(timeout, done_rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(BridgeError::GateClosed),
            Err(_) => Err(BridgeError::Timeout(timeout)),
        }
    }
}

pub struct GateServer {
    rx: Receiver<ExecutionSlot>,
}

impl GateServer {
    /// Drain and execute pending work. Called once per host tick from the
    /// host's own thread; this is the only place handlers run, which is what
    /// makes host-state access strictly serialized.
    pub fn pump(&self, ctx: &mut HostContext, registry: &CommandRegistry) -> usize {
        let mut served = 0;
        while let Ok(slot) = self.rx.try_recv() {
            let result = execute(ctx, registry, &slot.command);
            if slot.responder.send(result).is_err() {
                debug!(
                    "[Forge bridge] dropping late result for abandoned '{}' command",
                    slot.command.command_type
                );
            }
            served += 1;
        }
        served
    }
}

/// Run one command, containing every failure mode as an error Result. A
/// handler fault must never unwind into the host's main loop.
fn execute(ctx: &mut HostContext, registry: &CommandRegistry, command: &Command) -> Value {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| registry.dispatch(ctx, command)));
    match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(message)) => error_response(message),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                "[Forge bridge] command '{}' panicked: {message}",
                command.command_type
            );
            error_response(format!(
                "Command '{}' failed: {message}",
                command.command_type
            ))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
