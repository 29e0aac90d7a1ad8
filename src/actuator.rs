//! Fire-and-forget actuator command dispatch.
//!
//! The presence machine must never wait on the LED strip: a slow or
//! unreachable actuator cannot be allowed to stall frame ingestion. Commands
//! therefore go through an mpsc channel to a detached task that forwards
//! them to the external sender process. Failures on that path are logged
//! and dropped; retry policy belongs to the sender, not to this loop.
//!
//! ```text
//! Run loop ──► ActuatorHandle ──► mpsc ──► actuator task ──► sender process
//! ```

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default channel capacity; transitions are rare, this never fills in
/// practice.
pub const DEFAULT_COMMAND_CAPACITY: usize = 16;

/// LED device name on the actuator bus.
const ACTUATOR_DEVICE: &str = "ledhr";
/// Source tag identifying this bridge to the actuator.
const ACTUATOR_SOURCE: &str = "mirror";
/// Device the sender process addresses.
const DEFAULT_TARGET: &str = "led_strip_01";

/// An outbound brightness instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorCommand {
    /// Device the sender addresses.
    pub target: String,
    /// Brightness 0..=100.
    pub brightness: u8,
}

impl ActuatorCommand {
    /// Command for the default LED strip.
    pub fn brightness(brightness: u8) -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            brightness,
        }
    }
}

/// Wire payload handed to the sender process.
#[derive(Debug, Serialize)]
pub struct CommandPayload {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub packet: CommandPacket,
}

/// Inner packet of the wire payload.
#[derive(Debug, Serialize)]
pub struct CommandPacket {
    pub device: String,
    pub source: String,
    pub payload: BrightnessPayload,
}

#[derive(Debug, Serialize)]
pub struct BrightnessPayload {
    pub brightness: u8,
}

impl From<&ActuatorCommand> for CommandPayload {
    fn from(cmd: &ActuatorCommand) -> Self {
        CommandPayload {
            device_id: cmd.target.clone(),
            packet: CommandPacket {
                device: ACTUATOR_DEVICE.to_string(),
                source: ACTUATOR_SOURCE.to_string(),
                payload: BrightnessPayload {
                    brightness: cmd.brightness,
                },
            },
        }
    }
}

/// Handle for dispatching commands; cheap to clone.
#[derive(Clone)]
pub struct ActuatorHandle {
    tx: mpsc::Sender<ActuatorCommand>,
}

impl ActuatorHandle {
    /// Create a handle and the receiving end for the dispatch task.
    pub fn channel(capacity: usize) -> (ActuatorHandle, mpsc::Receiver<ActuatorCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ActuatorHandle { tx }, rx)
    }

    /// Dispatch a command, fire-and-forget.
    ///
    /// A full or closed channel drops the command with a warning; the
    /// caller never blocks and never sees the failure.
    pub fn dispatch(&self, cmd: ActuatorCommand) {
        if let Err(e) = self.tx.try_send(cmd) {
            tracing::warn!("dropping actuator command: {}", e);
        }
    }
}

/// Forwards command payloads to the external sender process.
///
/// The sender owns transport, addressing, and retries; this side only
/// launches it with the JSON payload as the final argument.
#[derive(Debug, Clone)]
pub struct CommandForwarder {
    program: String,
    args: Vec<String>,
}

impl CommandForwarder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Launch the sender for one payload. Does not wait for completion.
    fn forward(&self, payload: &CommandPayload) -> std::io::Result<()> {
        let json = serde_json::to_string(payload)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(json)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map(drop)
    }
}

/// Spawn the actuator dispatch task.
///
/// Drains the command channel for the process lifetime; exits when every
/// `ActuatorHandle` has been dropped.
pub fn spawn_actuator_task(
    mut rx: mpsc::Receiver<ActuatorCommand>,
    forwarder: CommandForwarder,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let payload = CommandPayload::from(&cmd);
            match forwarder.forward(&payload) {
                Ok(()) => {
                    tracing::info!(brightness = cmd.brightness, "LED brightness command sent")
                }
                Err(e) => tracing::warn!("failed to send LED command: {}", e),
            }
        }
    })
}
