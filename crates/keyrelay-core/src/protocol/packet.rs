//! Binary codec for the serial packet sent to the hardware controller.
//!
//! Wire format:
//! ```text
//! [player:1][code:1][state:1]
//! ```
//! `player` is 1 or 2, `code` is the low byte of the key code, and `state`
//! is 1 for pressed, 0 for released.  There is no header, length, or
//! checksum; the controller frames the stream by counting bytes.

use thiserror::Error;

use crate::domain::device::KeyTransition;
use crate::domain::pairing::Player;

/// Size of one packet on the wire.
pub const PACKET_LEN: usize = 3;

/// Errors that can occur while decoding a packet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// The byte slice is shorter than one packet.
    #[error("insufficient data: need {PACKET_LEN} bytes, got {0}")]
    InsufficientData(usize),

    /// The player byte is neither 1 nor 2.
    #[error("invalid player byte: 0x{0:02X}")]
    InvalidPlayer(u8),

    /// The state byte is neither 0 nor 1.
    #[error("invalid state byte: 0x{0:02X}")]
    InvalidState(u8),
}

/// One key transition as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub player: Player,
    /// Low 8 bits of the originating key code.
    pub code: u8,
    pub pressed: bool,
}

impl Packet {
    /// Builds the packet for a transition relayed on behalf of `player`.
    ///
    /// Key codes above 0xFF keep only their low byte.
    pub fn from_transition(player: Player, transition: &KeyTransition) -> Self {
        Self {
            player,
            code: (transition.code & 0xFF) as u8,
            pressed: transition.pressed,
        }
    }

    /// Encodes the packet into its 3 wire bytes.
    pub fn to_bytes(self) -> [u8; PACKET_LEN] {
        [self.player.number(), self.code, u8::from(self.pressed)]
    }

    /// Decodes one packet from the start of `bytes`.
    ///
    /// Extra trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError`] if fewer than 3 bytes are available or the
    /// player/state bytes are out of range.
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < PACKET_LEN {
            return Err(PacketError::InsufficientData(bytes.len()));
        }
        let player = Player::try_from(bytes[0]).map_err(PacketError::InvalidPlayer)?;
        let pressed = match bytes[2] {
            0 => false,
            1 => true,
            other => return Err(PacketError::InvalidState(other)),
        };
        Ok(Self {
            player,
            code: bytes[1],
            pressed,
        })
    }
}

/// Encodes a relayed key edge straight into wire bytes.
///
/// Total over all inputs; `code` is truncated to its low byte.
///
/// # Examples
///
/// ```rust
/// use keyrelay_core::{encode, Player};
///
/// assert_eq!(encode(Player::One, 0x57, true), [0x01, 0x57, 0x01]);
/// assert_eq!(encode(Player::Two, 0x57, false), [0x02, 0x57, 0x00]);
/// assert_eq!(encode(Player::One, 0x141, true), [0x01, 0x41, 0x01]);
/// ```
pub fn encode(player: Player, code: u16, pressed: bool) -> [u8; PACKET_LEN] {
    [player.number(), (code & 0xFF) as u8, u8::from(pressed)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::DeviceId;

    #[test]
    fn test_encode_press_for_player_one() {
        assert_eq!(encode(Player::One, 0x57, true), [0x01, 0x57, 0x01]);
    }

    #[test]
    fn test_encode_release_for_player_two() {
        assert_eq!(encode(Player::Two, 0x57, false), [0x02, 0x57, 0x00]);
    }

    #[test]
    fn test_encode_truncates_wide_codes_to_low_byte() {
        assert_eq!(encode(Player::One, 0x141, true), [0x01, 0x41, 0x01]);
        assert_eq!(encode(Player::Two, 0xFF00, true), [0x02, 0x00, 0x01]);
    }

    #[test]
    fn test_from_transition_matches_free_encode() {
        // Arrange
        let t = KeyTransition::release(DeviceId::from_raw(9), 0x1A5);

        // Act
        let packet = Packet::from_transition(Player::Two, &t);

        // Assert
        assert_eq!(packet.code, 0xA5);
        assert_eq!(packet.to_bytes(), encode(Player::Two, 0x1A5, false));
    }

    #[test]
    fn test_decode_valid_packet() {
        let packet = Packet::decode(&[0x02, 0x41, 0x01]).expect("valid packet");
        assert_eq!(packet.player, Player::Two);
        assert_eq!(packet.code, 0x41);
        assert!(packet.pressed);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let packet = Packet::decode(&[0x01, 0x20, 0x00, 0xEE]).expect("valid packet");
        assert!(!packet.pressed);
    }

    #[test]
    fn test_decode_short_slice_returns_insufficient_data() {
        assert_eq!(
            Packet::decode(&[0x01, 0x41]),
            Err(PacketError::InsufficientData(2))
        );
    }

    #[test]
    fn test_decode_rejects_player_zero() {
        assert_eq!(
            Packet::decode(&[0x00, 0x41, 0x01]),
            Err(PacketError::InvalidPlayer(0))
        );
    }

    #[test]
    fn test_decode_rejects_state_two() {
        assert_eq!(
            Packet::decode(&[0x01, 0x41, 0x02]),
            Err(PacketError::InvalidState(2))
        );
    }
}
