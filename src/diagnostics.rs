//! Bus-health monitor (alternate run mode).
//!
//! Two sensor nodes share the UART bus without arbitration, so overlapping
//! transmissions show up as frames arriving implausibly close together or
//! as undecodable bytes. This collector reuses the assembler and decoder
//! but replaces downstream emission with timing analysis and a category
//! tally printed at shutdown.

use std::time::{Duration, Instant};

use crate::decode::DecodedRecord;
use crate::framing::LineAssembler;

/// Frames closer together than this are suspected collisions.
pub const COLLISION_THRESHOLD: Duration = Duration::from_millis(10);

/// Category a frame lands in, by lightweight content heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    HeartRate,
    Presence,
    Other,
    /// Decode failure, usually mangled bytes from a collision.
    Corrupted,
}

impl Category {
    /// Heuristic match on decoded content; substring checks on purpose,
    /// corrupted packets rarely parse as JSON.
    fn of(record: &DecodedRecord) -> Category {
        let text = match record {
            DecodedRecord::Text(text) => text,
            DecodedRecord::RawHex(_) => return Category::Corrupted,
        };
        if text.contains("avg_bpm") || text.contains("ir_value") {
            Category::HeartRate
        } else if text.contains("event") && (text.contains("EXIT") || text.contains("ENTER")) {
            Category::Presence
        } else {
            Category::Other
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Category::HeartRate => "HEARTRATE",
            Category::Presence => "PRESENCE",
            Category::Other => "OTHER",
            Category::Corrupted => "CORRUPTED",
        }
    }
}

/// Frame counters, reset only at process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticTally {
    pub heartrate: u64,
    pub presence: u64,
    pub other: u64,
    pub corrupted: u64,
}

impl DiagnosticTally {
    fn count(&mut self, category: Category) {
        match category {
            Category::HeartRate => self.heartrate += 1,
            Category::Presence => self.presence += 1,
            Category::Other => self.other += 1,
            Category::Corrupted => self.corrupted += 1,
        }
    }
}

/// One analyzed frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub category: Category,
    /// Time since the previous frame, `None` for the first one.
    pub delta: Option<Duration>,
    /// Suspected collision: previous frame closer than the threshold.
    pub collision: bool,
    /// Leading slice of the payload for the log line.
    pub preview: String,
}

/// Passive variant of the listener pipeline.
pub struct DiagnosticCollector {
    assembler: LineAssembler,
    tally: DiagnosticTally,
    last_arrival: Option<Instant>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            assembler: LineAssembler::new(),
            tally: DiagnosticTally::default(),
            last_arrival: None,
        }
    }

    /// Feed one chunk; `now` is the arrival instant (injected so timing
    /// behavior is testable).
    pub fn observe(&mut self, chunk: &[u8], now: Instant) -> Vec<FrameReport> {
        let mut reports = Vec::new();

        for frame in self.assembler.push(chunk) {
            let delta = self.last_arrival.map(|prev| now - prev);
            self.last_arrival = Some(now);

            // Strict on both ends: delta of zero means frames from the
            // same read, not an overlap on the wire.
            let collision = delta
                .map(|d| d > Duration::ZERO && d < COLLISION_THRESHOLD)
                .unwrap_or(false);

            let record = DecodedRecord::decode(&frame);
            let category = Category::of(&record);
            self.tally.count(category);

            let payload = record.payload();
            let preview: String = payload.chars().take(100).collect();

            let report = FrameReport {
                category,
                delta,
                collision,
                preview,
            };
            log_report(&report);
            reports.push(report);
        }

        reports
    }

    pub fn tally(&self) -> DiagnosticTally {
        self.tally
    }

    /// Print the shutdown summary on the diagnostic channel.
    pub fn print_summary(&self) {
        let t = self.tally;
        tracing::info!("packet statistics:");
        tracing::info!("  heartrate: {}", t.heartrate);
        tracing::info!("  presence:  {}", t.presence);
        tracing::info!("  other:     {}", t.other);
        if t.corrupted > 0 {
            tracing::warn!("  corrupted: {} (bus collisions detected!)", t.corrupted);
        } else {
            tracing::info!("  corrupted: 0");
        }
    }
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn log_report(report: &FrameReport) {
    let delta_ms = report
        .delta
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0);
    if report.collision {
        tracing::warn!(
            "+{:6.1}ms {:10} COLLISION? {}",
            delta_ms,
            report.category.label(),
            report.preview
        );
    } else {
        tracing::info!(
            "+{:6.1}ms {:10} {}",
            delta_ms,
            report.category.label(),
            report.preview
        );
    }
}
