//! Byte-stream reassembly of packets, as performed by the controller.
//!
//! The serial line carries packets back to back with no delimiter.  The
//! receiver simply counts: every 3 bytes form one packet, then it starts
//! over.  A single lost byte therefore shifts every later packet, which is
//! accepted behaviour for this link.

use super::packet::{Packet, PacketError, PACKET_LEN};

/// Accumulates raw bytes and yields complete packets.
#[derive(Debug, Default, Clone)]
pub struct PacketAssembler {
    buf: [u8; PACKET_LEN],
    filled: usize,
}

impl PacketAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte.
    ///
    /// Returns `Some` once a third byte completes a frame; the frame is then
    /// decoded (and may be invalid).  The assembler resets either way.
    pub fn push(&mut self, byte: u8) -> Option<Result<Packet, PacketError>> {
        self.buf[self.filled] = byte;
        self.filled += 1;
        if self.filled < PACKET_LEN {
            return None;
        }
        self.filled = 0;
        Some(Packet::decode(&self.buf))
    }

    /// Feeds a slice and collects every frame it completes.
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<Result<Packet, PacketError>> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Number of bytes of the current, incomplete frame.
    pub fn pending(&self) -> usize {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pairing::Player;

    #[test]
    fn test_three_bytes_complete_one_packet() {
        // Arrange
        let mut asm = PacketAssembler::new();

        // Act
        let first = asm.push(0x01);
        let second = asm.push(0x41);
        let third = asm.push(0x01);

        // Assert
        assert!(first.is_none());
        assert!(second.is_none());
        let packet = third.expect("frame complete").expect("valid packet");
        assert_eq!(packet.player, Player::One);
        assert_eq!(packet.code, 0x41);
        assert!(packet.pressed);
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_split_writes_are_reassembled() {
        let mut asm = PacketAssembler::new();
        assert!(asm.extend(&[0x02, 0x57]).is_empty());
        assert_eq!(asm.pending(), 2);

        let frames = asm.extend(&[0x00, 0x01, 0x20, 0x01]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Packet::decode(&[0x02, 0x57, 0x00]));
        assert_eq!(frames[1], Packet::decode(&[0x01, 0x20, 0x01]));
    }

    #[test]
    fn test_invalid_frame_is_reported_and_assembler_resets() {
        let mut asm = PacketAssembler::new();
        let frames = asm.extend(&[0x07, 0x41, 0x01, 0x01, 0x41, 0x00]);
        assert_eq!(frames[0], Err(PacketError::InvalidPlayer(7)));
        assert!(frames[1].is_ok());
    }
}
