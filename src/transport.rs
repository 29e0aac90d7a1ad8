//! Serial transport.
//!
//! `serialport` reads are blocking with a short timeout, so a dedicated
//! reader thread pulls chunks off the wire and forwards them over a bounded
//! channel to the async run loop. The loop side stays non-blocking and
//! responsive to cancellation; the thread exits when the stop flag is set
//! or the loop drops its receiver, releasing the port handle either way.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, DataBits, Parity, StopBits};
use tokio::sync::mpsc;

use crate::error::Result;

/// Read buffer size per poll.
const READ_CHUNK: usize = 4096;
/// Chunk channel depth between the reader thread and the run loop.
const CHANNEL_CAPACITY: usize = 64;

/// Serial line settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyTHS1`.
    pub path: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read timeout; bounds each poll so shutdown stays responsive.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyTHS1".to_string(),
            baud_rate: 115_200,
            timeout: Duration::from_millis(100),
        }
    }
}

/// A running serial source: reader thread plus chunk channel.
pub struct SerialSource {
    rx: mpsc::Receiver<Bytes>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SerialSource {
    /// Open the port (8N1) and start the reader thread.
    ///
    /// Stale input left over from before the process started is flushed.
    /// An open failure is fatal to the caller; there is nothing to bridge
    /// without a port.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        tracing::info!(
            "opening serial port {} @ {} baud",
            config.path,
            config.baud_rate
        );

        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.timeout)
            .open()?;
        port.clear(ClearBuffer::Input)?;

        tracing::info!("serial port connected, waiting for data");

        Ok(Self::spawn(port))
    }

    /// Start the reader thread over any byte source.
    ///
    /// Tests drive this with in-memory readers; production goes through
    /// [`SerialSource::open`].
    fn spawn(reader: impl Read + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = std::thread::spawn(move || reader_loop(reader, tx, stop_flag));

        Self {
            rx,
            stop,
            thread: Some(thread),
        }
    }

    /// Receive the next chunk; `None` once the reader has stopped and the
    /// channel is drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Stop the reader thread and release the port.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // The thread may be parked in a send against a full channel;
        // closing the receiver fails that send so the thread can observe
        // the stop flag instead of waiting for capacity that never comes.
        self.rx.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("serial reader thread panicked");
            }
        }
        tracing::info!("serial port closed");
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

/// Blocking poll loop on the reader thread.
///
/// Timeouts are the idle case, not errors. Any other read error logs and
/// ends the loop; the run loop sees the closed channel and exits.
fn reader_loop(mut reader: impl Read, tx: mpsc::Sender<Bytes>, stop: Arc<AtomicBool>) {
    let mut buf = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Relaxed) {
        match reader.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                if tx.blocking_send(chunk).is_err() {
                    // Run loop went away or shutdown closed the channel;
                    // nothing left to feed.
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!("serial read error: {}", e);
                break;
            }
        }
    }
    // Port handle drops here, releasing the device.
}
