//! In-process stand-in for the hardware controller.
//!
//! Bytes written are reassembled three at a time, exactly like the
//! controller's UART handler.  Each valid packet is recorded and its bytes
//! are queued for read-back, so the dispatcher sees the same echo it would
//! see from real hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use keyrelay_core::{Packet, PacketAssembler};
use tracing::warn;

use crate::application::dispatch::{Transport, TransportError};

/// Shared log of packets the loopback controller has received.
pub type ReceivedPackets = Arc<Mutex<Vec<Packet>>>;

/// [`Transport`] that never leaves the process.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    assembler: PacketAssembler,
    received: ReceivedPackets,
    echo: VecDeque<u8>,
    echo_enabled: bool,
}

impl LoopbackTransport {
    /// Creates a loopback controller that echoes every valid packet.
    pub fn new() -> Self {
        Self {
            echo_enabled: true,
            ..Self::default()
        }
    }

    /// Creates a loopback controller that stays silent.
    pub fn without_echo() -> Self {
        Self::default()
    }

    /// Handle to the received-packet log; stays valid after the transport
    /// moves to the dispatch thread.
    pub fn received_packets(&self) -> ReceivedPackets {
        Arc::clone(&self.received)
    }
}

impl Transport for LoopbackTransport {
    fn write_packet(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for frame in self.assembler.extend(bytes) {
            match frame {
                Ok(packet) => {
                    if self.echo_enabled {
                        self.echo.extend(packet.to_bytes());
                    }
                    self.received
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(packet);
                }
                Err(e) => warn!("loopback controller rejected frame: {e}"),
            }
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        Ok(self.echo.len())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = buf.len().min(self.echo.len());
        for (slot, byte) in buf.iter_mut().zip(self.echo.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
