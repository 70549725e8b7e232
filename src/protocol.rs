//! Newline-framed JSON codec for the bridge wire protocol.
//!
//! Every message is one JSON object followed by `\n`. JSON string escaping
//! guarantees the delimiter never appears unescaped inside a frame, so the
//! framing is unambiguous without length prefixes.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One command as received on the wire: a type tag plus an untyped parameter
/// bag. Each handler validates and coerces its own parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Command {
    pub fn new(command_type: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            command_type: command_type.into(),
            params,
        }
    }

    /// Parse a decoded frame into a command. Missing or mistyped fields are a
    /// protocol error for that message only.
    pub fn from_value(value: Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| format!("Invalid command: {e}"))
    }
}

/// Encode one message as a self-delimiting frame.
pub fn encode_frame(value: &Value) -> Vec<u8> {
    let mut bytes = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    bytes.push(b'\n');
    bytes
}

/// Decode a single frame. The returned error is a per-frame decode error; the
/// stream remains usable at the next delimiter boundary.
pub fn decode_frame(line: &str) -> Result<Value, String> {
    serde_json::from_str(line.trim()).map_err(|e| format!("Invalid JSON: {e}"))
}

/// The conventional error response shape: `{"error": "<message>"}`.
pub fn error_response(message: impl Into<String>) -> Value {
    serde_json::json!({ "error": message.into() })
}

/// Lazy sequence of frames decoded from a byte stream.
///
/// A malformed line yields `Err` for that frame and decoding continues with
/// the next line; the sequence ends when the stream does (EOF or a read
/// error, at which point resynchronization is impossible).
pub struct Frames<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> Frames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for Frames<R> {
    type Item = Result<Value, String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {
                    if self.line.trim().is_empty() {
                        continue;
                    }
                    return Some(decode_frame(&self.line));
                }
            }
        }
    }
}
