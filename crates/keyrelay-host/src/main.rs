//! KeyRelay host entry point.
//!
//! Loads configuration, opens the transport, and runs one relay session
//! until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- config.toml or defaults
//!  └─ open transport           -- serial port or loopback controller
//!  └─ run_relay()
//!       ├─ PlatformInputSource (Raw Input message loop thread)
//!       ├─ keyrelay-capture    (pairing + routing)
//!       └─ keyrelay-dispatch   (packet writes)
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyrelay_host::application::dispatch::Transport;
use keyrelay_host::application::relay::{run_relay, RelayOptions};
use keyrelay_host::infrastructure::input_source::PlatformInputSource;
use keyrelay_host::infrastructure::storage::config::{self, TransportKind};
use keyrelay_host::infrastructure::transport::{LoopbackTransport, SerialTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("failed to load configuration")?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.relay.log_level)),
        )
        .init();

    info!("KeyRelay starting");

    let pairing_key = config.pairing_key_code()?;
    let transport: Box<dyn Transport> = match config.transport.kind {
        TransportKind::Serial => Box::new(
            SerialTransport::open(&config.serial_settings())
                .context("cannot reach the controller")?,
        ),
        TransportKind::Loopback => {
            warn!("loopback transport selected; packets stay in this process");
            Box::new(LoopbackTransport::new())
        }
    };

    let options = RelayOptions {
        pairing_key,
        dispatch: config.dispatch_settings(),
    };
    let source = Arc::new(PlatformInputSource::default());

    info!("press Ctrl-C to exit");
    let report = run_relay(source, transport, options, shutdown_signal()).await?;

    info!(packets = report.dispatch.packets_sent, "KeyRelay stopped");
    Ok(())
}

/// Resolves on Ctrl-C.  If the handler cannot be installed, never resolves;
/// the session then ends only when a worker thread does.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
