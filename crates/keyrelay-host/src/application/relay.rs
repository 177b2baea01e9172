//! Relay session: owns the two worker threads for one run of the program.
//!
//! ```text
//!  InputSource ──stream──► keyrelay-capture ──EventChannel──► keyrelay-dispatch ──► Transport
//!                          (CapturePipeline)                  (SerialDispatcher)
//! ```
//!
//! [`run_relay`] starts the input source, spawns both threads, then waits on
//! the async side until `shutdown` resolves or either thread finishes.
//!
//! Shutdown runs in this order:
//!
//! 1. `InputSource::stop()`; the transition stream ends.
//! 2. The capture thread returns and drops the channel sender.
//! 3. The `running` flag is cleared; the dispatcher drains the queue and exits.
//! 4. Both threads are joined.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use keyrelay_core::{keymap, PairingCoordinator};
use thiserror::Error;
use tracing::{error, info, warn};

use super::capture::{CapturePipeline, CaptureSummary};
use super::device_registry::{DeviceNameLookup, DeviceRegistry};
use super::dispatch::{DispatchError, DispatchSettings, DispatchSummary, SerialDispatcher, Transport};
use super::event_channel::event_channel;
use crate::infrastructure::input_source::{CaptureError, InputSource};

/// How often the session checks whether a worker thread has exited.
const WATCH_INTERVAL: Duration = Duration::from_millis(100);

/// Error type for a relay session.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("input capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{0} thread panicked")]
    Panicked(&'static str),
    #[error("capture stopped because the dispatcher exited")]
    DispatcherGone,
}

/// Settings for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    pub pairing_key: u16,
    pub dispatch: DispatchSettings,
}

/// What happened during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub capture: CaptureSummary,
    pub dispatch: DispatchSummary,
}

/// Runs a relay session until `shutdown` resolves or a worker thread exits.
///
/// # Errors
///
/// - [`RelayError::Capture`] if the input source cannot start.
/// - [`RelayError::Dispatch`] if a transport write failed.
/// - [`RelayError::Spawn`] / [`RelayError::Panicked`] for thread failures.
pub async fn run_relay<S, F>(
    source: Arc<S>,
    transport: Box<dyn Transport>,
    options: RelayOptions,
    shutdown: F,
) -> Result<RelayReport, RelayError>
where
    S: InputSource + 'static,
    F: Future<Output = ()>,
{
    let stream = source.start()?;
    let running = Arc::new(AtomicBool::new(true));
    let (events_tx, events_rx) = event_channel();

    let dispatcher = SerialDispatcher::new(transport, options.dispatch);
    let dispatch_handle = match dispatcher.spawn(events_rx, Arc::clone(&running)) {
        Ok(handle) => handle,
        Err(source_err) => {
            source.stop();
            return Err(RelayError::Spawn {
                name: "dispatch",
                source: source_err,
            });
        }
    };

    let registry = DeviceRegistry::new(Arc::clone(&source) as Arc<dyn DeviceNameLookup>);
    let pipeline = CapturePipeline::new(
        PairingCoordinator::new(options.pairing_key),
        registry,
        events_tx,
    );
    let capture_handle = match thread::Builder::new()
        .name("keyrelay-capture".to_string())
        .spawn(move || pipeline.run(stream))
    {
        Ok(handle) => handle,
        Err(spawn_err) => {
            // The unspawned pipeline took the sender with it; the
            // dispatcher sees the channel close and exits.
            source.stop();
            running.store(false, Ordering::Relaxed);
            match join("dispatch", dispatch_handle).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("dispatcher failed during aborted start: {e}"),
                Err(e) => warn!("{e} during aborted start"),
            }
            return Err(RelayError::Spawn {
                name: "capture",
                source: spawn_err,
            });
        }
    };

    let key = keymap::describe(options.pairing_key);
    info!("press {key} on the player 1 keyboard, then {key} on the player 2 keyboard");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = tokio::time::sleep(WATCH_INTERVAL) => {
                if dispatch_handle.is_finished() {
                    warn!("dispatcher exited; stopping capture");
                    break;
                }
                if capture_handle.is_finished() {
                    warn!("input stream ended; stopping dispatcher");
                    break;
                }
            }
        }
    }

    source.stop();
    let capture = join("capture", capture_handle).await?;
    running.store(false, Ordering::Relaxed);
    let dispatch = join("dispatch", dispatch_handle).await?;

    let dispatch = dispatch.map_err(|e| {
        error!("relay stopped on transport failure: {e}");
        RelayError::from(e)
    })?;
    let capture = capture.map_err(|_| RelayError::DispatcherGone)?;

    info!(
        observed = capture.observed,
        forwarded = capture.forwarded,
        devices = capture.devices,
        packets = dispatch.packets_sent,
        paired = capture.paired,
        "relay session finished"
    );
    Ok(RelayReport { capture, dispatch })
}

/// Joins a worker thread without blocking the async runtime.
async fn join<T: Send + 'static>(
    name: &'static str,
    handle: JoinHandle<T>,
) -> Result<T, RelayError> {
    match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) | Err(_) => Err(RelayError::Panicked(name)),
    }
}
