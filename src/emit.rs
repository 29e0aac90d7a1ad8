//! Primary output channel.
//!
//! The downstream consumer reads one JSON object per line from stdout.
//! Log and diagnostic text goes to stderr via `tracing`, so the two
//! channels never interleave.
//!
//! # Important
//!
//! - Uses an explicit `\n`, NOT `println!` (which may add `\r\n` on
//!   Windows)
//! - Flushes after every line (the consumer waits for complete lines)

use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::decode::DecodedRecord;
use crate::error::Result;

/// Kind tag of an output event, serialized under the JSON key `"type"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// Decoded UTF-8 text payload.
    #[serde(rename = "uart_chunk")]
    Chunk,
    /// Hex fallback payload from a decode failure.
    #[serde(rename = "uart_raw_hex")]
    RawHex,
}

/// The externally visible unit emitted on the primary channel.
#[derive(Debug, Clone, Serialize)]
pub struct OutputEvent {
    /// ISO-8601 timestamp taken at emission.
    pub timestamp: String,
    /// Payload string (decoded text, hex, or a synthetic signal).
    pub data: String,
    /// Payload kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl OutputEvent {
    /// Event for one decoded record, timestamped now.
    pub fn from_record(record: &DecodedRecord) -> Self {
        let kind = if record.is_raw_hex() {
            EventKind::RawHex
        } else {
            EventKind::Chunk
        };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            data: record.payload().to_string(),
            kind,
        }
    }

    /// Synthetic event for a state-machine signal such as `screen_dim`.
    pub fn signal(name: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            data: format!(r#"{{"event":"{}"}}"#, name),
            kind: EventKind::Chunk,
        }
    }
}

/// Writes output events as self-contained JSON lines.
pub struct Emitter<W: Write> {
    sink: W,
}

impl Emitter<std::io::Stdout> {
    /// Emitter over the process stdout.
    pub fn stdout() -> Self {
        Emitter {
            sink: std::io::stdout(),
        }
    }
}

impl<W: Write> Emitter<W> {
    /// Emitter over any writer; tests use a `Vec<u8>`.
    pub fn new(sink: W) -> Self {
        Emitter { sink }
    }

    /// Write one event as a single line and flush.
    pub fn emit(&mut self, event: &OutputEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        self.sink.write_all(json.as_bytes())?;
        self.sink.write_all(b"\n")?;
        self.sink.flush()?;
        Ok(())
    }

    /// Consume the emitter and return the sink (test helper).
    pub fn into_inner(self) -> W {
        self.sink
    }
}
