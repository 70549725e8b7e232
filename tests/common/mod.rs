//! Shared harness: a full bridge stack (listener + gate + host tick loop)
//! on an ephemeral port, plus a blocking wire client.

// Each integration test binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use forge_bridge::protocol::Frames;
use forge_bridge::{
    execution_gate, BridgeConfig, BridgeListener, CommandRegistry, HostContext,
};

pub struct TestStack {
    pub addr: SocketAddr,
    pub content_dir: tempfile::TempDir,
    stop: Arc<AtomicBool>,
    host: Option<thread::JoinHandle<()>>,
    _listener: BridgeListener,
}

impl TestStack {
    pub fn start() -> Self {
        Self::start_with(
            CommandRegistry::with_builtin_commands(),
            Duration::from_secs(5),
        )
    }

    pub fn start_with(registry: CommandRegistry, exec_timeout: Duration) -> Self {
        let content_dir = tempfile::tempdir().expect("tempdir");
        let config = BridgeConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            exec_timeout,
            content_dir: content_dir.path().to_path_buf(),
        };

        let (gate, server) = execution_gate();
        let listener = BridgeListener::start(&config, gate).expect("start listener");
        let addr = listener.local_addr();

        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let dir = content_dir.path().to_path_buf();
        let host = thread::spawn(move || {
            let mut ctx = HostContext::with_lua(dir);
            while !flag.load(Ordering::Relaxed) {
                server.pump(&mut ctx, &registry);
                thread::sleep(Duration::from_millis(1));
            }
        });

        Self {
            addr,
            content_dir,
            stop,
            host: Some(host),
            _listener: listener,
        }
    }
}

impl Drop for TestStack {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(host) = self.host.take() {
            let _ = host.join();
        }
    }
}

/// Blocking client speaking the newline-framed wire protocol directly.
pub struct WireClient {
    writer: TcpStream,
    frames: Frames<BufReader<TcpStream>>,
}

impl WireClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("read timeout");
        let frames = Frames::new(BufReader::new(stream.try_clone().expect("clone stream")));
        Self {
            writer: stream,
            frames,
        }
    }

    pub fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).expect("write");
        self.writer.write_all(b"\n").expect("write delimiter");
        self.writer.flush().expect("flush");
    }

    pub fn read_response(&mut self) -> Value {
        self.frames
            .next()
            .expect("stream still open")
            .expect("response is one JSON frame")
    }

    pub fn command(&mut self, command_type: &str, params: Value) -> Value {
        self.send_command(command_type, params);
        self.read_response()
    }

    pub fn send_command(&mut self, command_type: &str, params: Value) {
        let frame = serde_json::json!({ "type": command_type, "params": params });
        self.send_line(&frame.to_string());
    }
}
