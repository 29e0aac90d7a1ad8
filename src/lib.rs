//! # uart-bridge
//!
//! Bridges the smart-mirror sensor bus (heart-rate and presence telemetry
//! over UART) into line-delimited JSON events for a downstream consumer,
//! and reacts to presence transitions by dimming or brightening the LED
//! strip through an external sender process.
//!
//! ## Architecture
//!
//! - **Primary channel** (stdout): one JSON object per line
//! - **Diagnostic channel** (stderr): `tracing` log output, never mixed in
//!
//! ```text
//! serial chunks → LineAssembler → DecodedRecord → { Emitter, classify }
//!                                                       → PresenceState → ActuatorHandle
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use uart_bridge::actuator::CommandForwarder;
//! use uart_bridge::transport::SerialConfig;
//!
//! #[tokio::main]
//! async fn main() -> uart_bridge::Result<()> {
//!     let config = SerialConfig::default();
//!     let forwarder = CommandForwarder::new("send-uart-command", vec![]);
//!     uart_bridge::listener::run_listener(&config, forwarder).await
//! }
//! ```

pub mod actuator;
pub mod classify;
pub mod decode;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod framing;
pub mod listener;
pub mod presence;
pub mod transport;

pub use error::{BridgeError, Result};
pub use listener::Pipeline;
