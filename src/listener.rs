//! Run loops: the listener pipeline and the diagnostic monitor.
//!
//! Both modes share the same shape: pull chunks from the serial source,
//! push them through the stages synchronously, stay responsive to Ctrl-C.
//! The listener emits structured events downstream; the diagnostic mode
//! only observes. Errors inside an iteration are logged and the loop moves
//! on; this process favors availability over crash-on-error.

use std::io::Write;
use std::time::Instant;

use crate::actuator::{
    spawn_actuator_task, ActuatorCommand, ActuatorHandle, CommandForwarder,
    DEFAULT_COMMAND_CAPACITY,
};
use crate::classify::{classify, Classification};
use crate::decode::DecodedRecord;
use crate::diagnostics::DiagnosticCollector;
use crate::emit::{Emitter, OutputEvent};
use crate::error::Result;
use crate::framing::LineAssembler;
use crate::presence::PresenceState;
use crate::transport::{SerialConfig, SerialSource};

/// The listener pipeline: assembler → decoder → emitter → classifier →
/// presence machine → actuator dispatch.
///
/// Owns all mutable pipeline state; one instance per transport, driven by
/// a single loop. Generic over the sink so tests can run it against a
/// `Vec<u8>`.
pub struct Pipeline<W: Write> {
    assembler: LineAssembler,
    state: PresenceState,
    emitter: Emitter<W>,
    actuator: ActuatorHandle,
}

impl<W: Write> Pipeline<W> {
    pub fn new(emitter: Emitter<W>, actuator: ActuatorHandle) -> Self {
        Self {
            assembler: LineAssembler::new(),
            state: PresenceState::default(),
            emitter,
            actuator,
        }
    }

    /// Run one chunk through every stage.
    ///
    /// Each frame is emitted before it is classified, so a malformed
    /// packet still reaches the consumer. Transitions additionally emit
    /// one synthetic event and dispatch one actuator command. A failed
    /// write loses only its own record; the remaining frames of the
    /// chunk still flow.
    pub fn ingest(&mut self, chunk: &[u8]) {
        for frame in self.assembler.push(chunk) {
            let record = DecodedRecord::decode(&frame);
            tracing::debug!("rx: {:.80}", record.payload());

            if let Err(e) = self.emitter.emit(&OutputEvent::from_record(&record)) {
                tracing::error!("failed to emit record: {}", e);
            }

            if let Classification::Presence(event) = classify(&record) {
                if let Some(transition) = self.state.apply(event) {
                    self.actuator
                        .dispatch(ActuatorCommand::brightness(transition.brightness));
                    if let Err(e) = self.emitter.emit(&OutputEvent::signal(transition.signal)) {
                        tracing::error!("failed to emit transition event: {}", e);
                    }
                    tracing::info!("presence transition: {}", transition.signal);
                }
            }
        }
    }

    /// Current presence state (for observability and tests).
    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Consume the pipeline, returning the emitter sink (test helper).
    pub fn into_sink(self) -> W {
        self.emitter.into_inner()
    }
}

/// Run the bridge in listener mode until cancelled.
///
/// Opens the serial port (fatal on failure), spawns the actuator task, and
/// processes chunks until Ctrl-C or port loss. The transport is closed on
/// every exit path.
pub async fn run_listener(config: &SerialConfig, forwarder: CommandForwarder) -> Result<()> {
    let mut source = SerialSource::open(config)?;

    let (actuator, command_rx) = ActuatorHandle::channel(DEFAULT_COMMAND_CAPACITY);
    let _actuator_task = spawn_actuator_task(command_rx, forwarder);

    let mut pipeline = Pipeline::new(Emitter::stdout(), actuator);
    let mut lost = false;

    loop {
        tokio::select! {
            chunk = source.recv() => {
                match chunk {
                    Some(chunk) => pipeline.ingest(&chunk),
                    None => {
                        tracing::error!("serial source closed unexpectedly");
                        lost = true;
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("listener stopped by signal");
                break;
            }
        }
    }

    source.shutdown();
    if lost {
        return Err(crate::error::BridgeError::TransportClosed);
    }
    Ok(())
}

/// Run the bridge in diagnostic mode until cancelled, then print the tally.
pub async fn run_diagnostics(config: &SerialConfig) -> Result<()> {
    let mut source = SerialSource::open(config)?;
    let mut collector = DiagnosticCollector::new();
    let mut lost = false;

    tracing::info!("monitoring for collisions");

    loop {
        tokio::select! {
            chunk = source.recv() => {
                match chunk {
                    Some(chunk) => {
                        collector.observe(&chunk, Instant::now());
                    }
                    None => {
                        tracing::error!("serial source closed unexpectedly");
                        lost = true;
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("monitor stopped by signal");
                break;
            }
        }
    }

    collector.print_summary();
    source.shutdown();
    if lost {
        return Err(crate::error::BridgeError::TransportClosed);
    }
    Ok(())
}
