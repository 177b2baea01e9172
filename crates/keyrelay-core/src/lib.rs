//! # keyrelay-core
//!
//! Shared library for KeyRelay containing the serial packet codec, the
//! player pairing state machine, and the Windows virtual-key name table.
//!
//! This crate has zero dependencies on OS APIs or serial ports; the host
//! application supplies those through traits.
//!
//! # Architecture overview (for beginners)
//!
//! KeyRelay turns two ordinary USB keyboards into two independent game
//! controllers.  Every key edge from either keyboard is tagged with the
//! keyboard it came from, mapped to "player 1" or "player 2", and written to
//! an FPGA over a serial line as a 3-byte packet.
//!
//! - **`domain`** – Device identity, key transitions, and the
//!   `PairingCoordinator` that decides which keyboard is which player.
//!
//! - **`protocol`** – The 3-byte wire format and a byte-stream reassembler
//!   that mirrors what the controller does on its side of the line.
//!
//! - **`keymap`** – Windows virtual-key names, used to parse the configured
//!   pairing key and to make debug logs readable.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::device::{DeviceId, KeyTransition};
pub use domain::pairing::{PairingCoordinator, PairingState, Player, RoutingDecision};
pub use protocol::assembler::PacketAssembler;
pub use protocol::packet::{encode, Packet, PacketError, PACKET_LEN};
