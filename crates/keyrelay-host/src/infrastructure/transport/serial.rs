//! Serial port transport.
//!
//! Opens the configured port at the configured baud rate (8N1, no flow
//! control) with a short read timeout, then waits briefly for the
//! controller to settle before the first write.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::application::dispatch::{Transport, TransportError};

/// Connection parameters for [`SerialTransport::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub open_settle: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "COM3".to_string(),
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(100),
            open_settle: Duration::from_millis(10),
        }
    }
}

/// [`Transport`] over a real serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens the port described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Open`] if the port does not exist, is busy,
    /// or rejects the settings.
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| TransportError::Open {
                port: settings.port.clone(),
                reason: e.to_string(),
            })?;

        info!(
            port = %settings.port,
            baud = settings.baud_rate,
            "connected to controller"
        );
        if !settings.open_settle.is_zero() {
            thread::sleep(settings.open_settle);
        }
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write_packet(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes).map_err(TransportError::Write)?;
        self.port.flush().map_err(TransportError::Write)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| TransportError::Read(io::Error::from(e)))
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                debug!("read-back timed out");
                Ok(0)
            }
            Err(e) => Err(TransportError::Read(e)),
        }
    }
}
