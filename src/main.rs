//! Binary entrypoint.
//!
//! ```text
//! uart-bridge [PORT] [BAUD] [--diagnose]
//! ```
//!
//! Listener mode (default) emits JSON events on stdout; `--diagnose` runs
//! the passive bus monitor instead. All logs go to stderr.

use tracing_subscriber::EnvFilter;

use uart_bridge::actuator::CommandForwarder;
use uart_bridge::transport::SerialConfig;
use uart_bridge::{listener, Result};

/// External process that delivers actuator commands to the bus.
const SENDER_PROGRAM: &str = "send-uart-command";

fn parse_args() -> (SerialConfig, bool) {
    let mut config = SerialConfig::default();
    let mut diagnose = false;
    let mut positional = 0;

    for arg in std::env::args().skip(1) {
        if arg == "--diagnose" {
            diagnose = true;
            continue;
        }
        match positional {
            0 => config.path = arg,
            1 => match arg.parse() {
                Ok(baud) => config.baud_rate = baud,
                Err(_) => tracing::warn!("ignoring invalid baud rate {:?}", arg),
            },
            _ => tracing::warn!("ignoring extra argument {:?}", arg),
        }
        positional += 1;
    }

    (config, diagnose)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs on stderr only; stdout belongs to the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (config, diagnose) = parse_args();
    tracing::info!(
        "uart-bridge starting: {} @ {} ({})",
        config.path,
        config.baud_rate,
        if diagnose { "diagnostic" } else { "listener" }
    );

    let result = if diagnose {
        listener::run_diagnostics(&config).await
    } else {
        let forwarder = CommandForwarder::new(SENDER_PROGRAM, Vec::new());
        listener::run_listener(&config, forwarder).await
    };

    if let Err(ref e) = result {
        tracing::error!("fatal: {}", e);
    }
    result
}
