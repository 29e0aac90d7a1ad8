//! Line assembler for accumulating partial serial reads.
//!
//! Uses `bytes::BytesMut` for buffer management. The sensor bus is a
//! newline-delimited text protocol, so framing here means: append whatever
//! the port handed us, split off every complete line, and keep the trailing
//! remainder for the next read. A frame split across any number of reads is
//! reassembled before it is yielded.
//!
//! # Example
//!
//! ```
//! use uart_bridge::framing::LineAssembler;
//!
//! let mut assembler = LineAssembler::new();
//!
//! // Data arrives in arbitrary chunks from the port
//! assert!(assembler.push(b"{\"avg_bpm\"").is_empty());
//! let frames = assembler.push(b":72}\nrest");
//! assert_eq!(&frames[0][..], b"{\"avg_bpm\":72}");
//! assert_eq!(assembler.buffered(), 4); // "rest" retained
//! ```

use bytes::{Bytes, BytesMut};

/// Frame delimiter on the sensor bus.
const DELIMITER: u8 = b'\n';

/// Maximum bytes retained while waiting for a delimiter.
///
/// A misbehaving or disconnected sender can stream garbage with no newline
/// forever; past this bound the whole buffer is discarded rather than
/// growing without limit. Bounded, acknowledged data loss.
pub const MAX_BUFFERED_BYTES: usize = 10_000;

/// Accumulates raw chunks and extracts complete newline-delimited frames.
///
/// Frames are yielded in arrival order with the delimiter (and any trailing
/// `\r`) removed. Consecutive delimiters yield empty frames; downstream
/// decoding still sees them.
#[derive(Debug)]
pub struct LineAssembler {
    /// Accumulated bytes from port reads.
    buffer: BytesMut,
    /// Number of times the overflow policy has fired.
    overflows: u64,
}

impl LineAssembler {
    /// Create a new assembler with an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            overflows: 0,
        }
    }

    /// Push a chunk into the buffer and extract all complete frames.
    ///
    /// This is the main API for processing incoming data from the port.
    /// Returns the complete frames found (may be empty if still waiting
    /// for a delimiter). Partial data is buffered for the next push.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }

        // Overflow policy: no delimiter within the bound means the sender
        // is not speaking the line protocol; drop everything and warn once.
        if self.buffer.len() > MAX_BUFFERED_BYTES {
            tracing::warn!(
                discarded = self.buffer.len(),
                "line buffer overflow without delimiter, clearing"
            );
            self.buffer.clear();
            self.overflows += 1;
        }

        frames
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns `None` when no delimiter is present yet.
    fn try_extract_one(&mut self) -> Option<Bytes> {
        let pos = self.buffer.iter().position(|&b| b == DELIMITER)?;

        let mut frame = self.buffer.split_to(pos + 1);
        frame.truncate(pos);
        // CRLF senders are common on UART
        if frame.last() == Some(&b'\r') {
            frame.truncate(frame.len() - 1);
        }

        Some(frame.freeze())
    }

    /// Number of bytes currently buffered (no delimiter seen yet).
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of times the overflow policy discarded the buffer.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Clear the buffer without counting an overflow.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_frame() {
        let mut assembler = LineAssembler::new();

        let frames = assembler.push(b"hello\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"hello");
        assert!(assembler.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut assembler = LineAssembler::new();

        let frames = assembler.push(b"first\nsecond\nthird\n");

        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0][..], b"first");
        assert_eq!(&frames[1][..], b"second");
        assert_eq!(&frames[2][..], b"third");
        assert!(assembler.is_empty());
    }

    #[test]
    fn test_frame_split_across_pushes() {
        let mut assembler = LineAssembler::new();

        let frames = assembler.push(b"{\"node_type\":");
        assert!(frames.is_empty());
        assert_eq!(assembler.buffered(), 13);

        let frames = assembler.push(b"\"HP\"}\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"{\"node_type\":\"HP\"}");
        assert!(assembler.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut assembler = LineAssembler::new();
        let mut all_frames = Vec::new();

        for byte in b"hi\n" {
            all_frames.extend(assembler.push(&[*byte]));
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(&all_frames[0][..], b"hi");
    }

    #[test]
    fn test_empty_frames_from_consecutive_delimiters() {
        let mut assembler = LineAssembler::new();

        let frames = assembler.push(b"a\n\n\nb\n");

        assert_eq!(frames.len(), 4);
        assert_eq!(&frames[0][..], b"a");
        assert!(frames[1].is_empty());
        assert!(frames[2].is_empty());
        assert_eq!(&frames[3][..], b"b");
    }

    #[test]
    fn test_crlf_stripped() {
        let mut assembler = LineAssembler::new();

        let frames = assembler.push(b"line one\r\nline two\n");

        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"line one");
        assert_eq!(&frames[1][..], b"line two");
    }

    #[test]
    fn test_trailing_remainder_retained() {
        let mut assembler = LineAssembler::new();

        let frames = assembler.push(b"done\npartial");

        assert_eq!(frames.len(), 1);
        assert_eq!(assembler.buffered(), 7);

        let frames = assembler.push(b" frame\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"partial frame");
    }

    /// Exactly k delimiters yield exactly k frames with the exact
    /// pre-delimiter bytes, regardless of chunk boundaries.
    #[test]
    fn test_frame_count_independent_of_chunking() {
        let data = b"alpha\nbeta\n\ngamma delta\nepsilon\n";
        let expected: Vec<&[u8]> = vec![b"alpha", b"beta", b"", b"gamma delta", b"epsilon"];

        // Try every split point of the input into two chunks
        for split in 0..=data.len() {
            let mut assembler = LineAssembler::new();
            let mut frames = assembler.push(&data[..split]);
            frames.extend(assembler.push(&data[split..]));

            assert_eq!(frames.len(), expected.len(), "split at {}", split);
            for (frame, want) in frames.iter().zip(&expected) {
                assert_eq!(&frame[..], *want, "split at {}", split);
            }
            assert!(assembler.is_empty());
        }
    }

    #[test]
    fn test_overflow_clears_buffer_once() {
        let mut assembler = LineAssembler::new();

        let junk = vec![b'x'; MAX_BUFFERED_BYTES + 1];
        let frames = assembler.push(&junk);

        assert!(frames.is_empty());
        assert!(assembler.is_empty());
        assert_eq!(assembler.overflows(), 1);
    }

    #[test]
    fn test_recovery_after_overflow() {
        let mut assembler = LineAssembler::new();

        let junk = vec![b'x'; MAX_BUFFERED_BYTES + 1];
        assembler.push(&junk);
        assert_eq!(assembler.overflows(), 1);

        // A subsequent valid frame comes through intact
        let frames = assembler.push(b"{\"avg_bpm\":72}\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"{\"avg_bpm\":72}");
        assert_eq!(assembler.overflows(), 1);
    }

    #[test]
    fn test_under_threshold_is_retained() {
        let mut assembler = LineAssembler::new();

        let junk = vec![b'x'; MAX_BUFFERED_BYTES];
        let frames = assembler.push(&junk);

        assert!(frames.is_empty());
        assert_eq!(assembler.buffered(), MAX_BUFFERED_BYTES);
        assert_eq!(assembler.overflows(), 0);
    }

    #[test]
    fn test_delimited_data_never_overflows() {
        let mut assembler = LineAssembler::new();

        // Far more than the bound in total, but always delimited
        let line = vec![b'y'; 5_000];
        for _ in 0..10 {
            let mut chunk = line.clone();
            chunk.push(b'\n');
            let frames = assembler.push(&chunk);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].len(), 5_000);
        }
        assert_eq!(assembler.overflows(), 0);
    }
}
