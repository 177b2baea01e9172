//! Byte-stream transports implementing [`Transport`].
//!
//! - [`serial::SerialTransport`] – the real link to the controller.
//! - [`loopback::LoopbackTransport`] – an in-process controller that
//!   reassembles packets and echoes them back; used for dry runs and tests.
//!
//! [`Transport`]: crate::application::dispatch::Transport

pub mod loopback;
pub mod serial;

pub use loopback::{LoopbackTransport, ReceivedPackets};
pub use serial::{SerialSettings, SerialTransport};
