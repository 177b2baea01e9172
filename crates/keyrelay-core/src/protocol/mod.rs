//! Protocol module containing the 3-byte packet codec and stream reassembly.

pub mod assembler;
pub mod packet;

pub use assembler::PacketAssembler;
pub use packet::{encode, Packet, PacketError, PACKET_LEN};
