//! Frame decoding with hex fallback.
//!
//! Sensor nodes normally speak UTF-8 JSON, but a bus collision or a reset
//! mid-transmission produces arbitrary bytes. Decoding is total: a frame
//! that is not valid UTF-8 becomes a hex record instead of an error, so no
//! frame is ever silently dropped between the assembler and the emitter.

/// One decoded record per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRecord {
    /// Valid UTF-8 text, surrounding whitespace trimmed.
    Text(String),
    /// Undecodable bytes rendered as lowercase hex.
    RawHex(String),
}

impl DecodedRecord {
    /// Decode a frame. Never fails; invalid UTF-8 is a normal branch.
    pub fn decode(frame: &[u8]) -> DecodedRecord {
        match std::str::from_utf8(frame) {
            Ok(text) => DecodedRecord::Text(text.trim().to_string()),
            Err(_) => DecodedRecord::RawHex(to_hex(frame)),
        }
    }

    /// The payload string carried by this record.
    pub fn payload(&self) -> &str {
        match self {
            DecodedRecord::Text(s) | DecodedRecord::RawHex(s) => s,
        }
    }

    /// Whether this record came from a decode failure.
    pub fn is_raw_hex(&self) -> bool {
        matches!(self, DecodedRecord::RawHex(_))
    }
}

/// Lowercase hex rendering of raw bytes.
fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
