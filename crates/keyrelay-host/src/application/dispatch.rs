//! SerialDispatcher: turns forwarded events into packets on the serial line.
//!
//! Runs on its own thread and is the only owner of the [`Transport`].  For
//! every event it:
//!
//! 1. Builds the 3-byte packet (key code truncated to its low byte).
//! 2. Writes it.  A failed write is fatal; nothing is retried.
//! 3. Sleeps a short settle delay so the controller can answer.
//! 4. If the controller sent anything back, reads up to `readback_len` bytes
//!    and logs them.  The echo never influences what happens next.
//!
//! # Architecture
//!
//! The dispatcher depends only on the `Transport` trait.  The serial port and
//! the loopback controller live in `infrastructure::transport`.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use keyrelay_core::{Packet, PACKET_LEN};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::event_channel::{EventReceiver, ForwardedEvent, RecvOutcome};

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {port}: {reason}")]
    Open { port: String, reason: String },
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
}

/// Error type for the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Byte-stream connection to the hardware controller.
///
/// Infrastructure implementations wrap a serial port or a simulated
/// controller; unit tests use the generated `MockTransport`.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Writes all of `bytes` or fails.
    fn write_packet(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Number of bytes the controller has sent that are waiting to be read.
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Reads up to `buf.len()` bytes; returns how many were read.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// Timing and read-back settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Pause after each write before checking for a reply.
    pub settle_delay: Duration,
    /// Maximum bytes read back after each write; 0 disables read-back.
    pub readback_len: usize,
    /// How often the idle loop re-checks the shutdown flag.
    pub poll_interval: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(2),
            readback_len: PACKET_LEN,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Counters reported when the dispatch loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub packets_sent: u64,
    pub echo_bytes: u64,
}

/// The Serial Dispatcher use case.
pub struct SerialDispatcher {
    transport: Box<dyn Transport>,
    settings: DispatchSettings,
    summary: DispatchSummary,
}

impl SerialDispatcher {
    pub fn new(transport: Box<dyn Transport>, settings: DispatchSettings) -> Self {
        Self {
            transport,
            settings,
            summary: DispatchSummary::default(),
        }
    }

    /// Returns the counters accumulated so far.
    pub fn summary(&self) -> DispatchSummary {
        self.summary
    }

    /// Encodes and writes one event.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] if the write fails.  Read-back
    /// failures are logged and ignored.
    pub fn dispatch(&mut self, event: &ForwardedEvent) -> Result<Packet, DispatchError> {
        let ForwardedEvent { player, transition } = *event;
        let packet = Packet::from_transition(player, &transition);

        if transition.code > 0xFF {
            debug!(code = transition.code, sent = packet.code, "key code truncated to low byte");
        }
        info!(
            "P{} key {:#04x} {}",
            player.number(),
            transition.code,
            if transition.pressed { "DOWN" } else { "UP" }
        );

        self.transport.write_packet(&packet.to_bytes())?;
        self.summary.packets_sent += 1;

        if !self.settings.settle_delay.is_zero() {
            thread::sleep(self.settings.settle_delay);
        }
        self.drain_readback();
        Ok(packet)
    }

    /// Dispatches events until the channel closes or `running` is cleared.
    ///
    /// On shutdown, events already queued are still written before returning.
    ///
    /// # Errors
    ///
    /// Returns the first [`DispatchError`]; the loop stops at that point.
    pub fn run(
        mut self,
        events: EventReceiver,
        running: Arc<AtomicBool>,
    ) -> Result<DispatchSummary, DispatchError> {
        debug!(settings = ?self.settings, "dispatcher started");
        loop {
            if !running.load(Ordering::Relaxed) {
                while let Some(event) = events.try_recv() {
                    self.dispatch_or_log(&event)?;
                }
                break;
            }
            match events.recv_timeout(self.settings.poll_interval) {
                RecvOutcome::Event(event) => {
                    self.dispatch_or_log(&event)?;
                }
                RecvOutcome::TimedOut => {}
                RecvOutcome::Closed => break,
            }
        }
        info!(
            packets = self.summary.packets_sent,
            echo_bytes = self.summary.echo_bytes,
            "dispatcher stopped"
        );
        Ok(self.summary)
    }

    /// Runs [`SerialDispatcher::run`] on a dedicated `keyrelay-dispatch` thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(
        self,
        events: EventReceiver,
        running: Arc<AtomicBool>,
    ) -> io::Result<JoinHandle<Result<DispatchSummary, DispatchError>>> {
        thread::Builder::new()
            .name("keyrelay-dispatch".to_string())
            .spawn(move || self.run(events, running))
    }

    fn dispatch_or_log(&mut self, event: &ForwardedEvent) -> Result<(), DispatchError> {
        self.dispatch(event).map(|_| ()).map_err(|e| {
            error!("dispatch failed, stopping: {e}");
            e
        })
    }

    fn drain_readback(&mut self) {
        if self.settings.readback_len == 0 {
            return;
        }
        let available = match self.transport.bytes_available() {
            Ok(n) => n,
            Err(e) => {
                warn!("read-back check failed: {e}");
                return;
            }
        };
        if available == 0 {
            return;
        }

        let mut buf = vec![0u8; self.settings.readback_len];
        match self.transport.read_available(&mut buf) {
            Ok(n) => {
                let n = n.min(buf.len());
                self.summary.echo_bytes += n as u64;
                log_echo(&buf[..n]);
            }
            Err(e) => warn!("read-back failed: {e}"),
        }
    }
}

/// Logs controller read-back; decoded as a packet when it looks like one.
fn log_echo(bytes: &[u8]) {
    match Packet::decode(bytes) {
        Ok(packet) if bytes.len() == PACKET_LEN => info!(
            "controller: P{} key {:#04x} {}",
            packet.player.number(),
            packet.code,
            if packet.pressed { "DOWN" } else { "UP" }
        ),
        _ => info!("controller: {bytes:02X?}"),
    }
}
