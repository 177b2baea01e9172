//! PairingCoordinator: assigns two keyboards to the player 1 / player 2 slots.
//!
//! # The pairing ritual (for beginners)
//!
//! Nothing is configured in advance.  The first keyboard to press the pairing
//! key (Enter by default) becomes player 1; the next *different* keyboard to
//! press it becomes player 2.  After that every key edge from either keyboard
//! is relayed and the pairing key is just another key.
//!
//! ```text
//! Idle ──Enter(D)──► AwaitingSecondPlayer(D) ──Enter(E), E≠D──► Paired(D, E)
//! ```
//!
//! `Paired` is terminal for the process lifetime.  A third keyboard that
//! presses Enter while the coordinator waits for player 2 is accepted as
//! player 2; there is no way to reject it.

use tracing::trace;

use super::device::{DeviceId, KeyTransition};
use crate::keymap::windows_vk::VK_RETURN;

/// A logical player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    /// Returns the wire value (1 or 2).
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Player {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(other),
        }
    }
}

/// Where the coordinator is in the pairing ritual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    /// No keyboard has claimed a slot yet.
    Idle,
    /// Player 1 is known; waiting for a second, different keyboard.
    AwaitingSecondPlayer { player1: DeviceId },
    /// Both slots are assigned.  `player1 != player2` always holds.
    Paired { player1: DeviceId, player2: DeviceId },
}

/// What the capture path should do with an observed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// The transition advanced pairing and must not be relayed.
    Consumed,
    /// The transition belongs to a paired player and must be relayed.
    Forward(Player),
    /// Not relayable: pairing incomplete or the device is not a player.
    Drop,
}

/// Owns the pairing state machine.
///
/// One instance per process run, confined to the capture thread.  Only the
/// decisions it returns ever leave that thread.
#[derive(Debug, Clone)]
pub struct PairingCoordinator {
    state: PairingState,
    pairing_key: u16,
}

impl PairingCoordinator {
    /// Creates a coordinator in [`PairingState::Idle`] that pairs on `pairing_key`.
    pub fn new(pairing_key: u16) -> Self {
        Self {
            state: PairingState::Idle,
            pairing_key,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> PairingState {
        self.state
    }

    /// Returns the key code that advances pairing.
    pub fn pairing_key(&self) -> u16 {
        self.pairing_key
    }

    /// Returns `true` once both players are assigned.
    pub fn is_paired(&self) -> bool {
        matches!(self.state, PairingState::Paired { .. })
    }

    /// Returns the player slot held by `device`, if any.
    ///
    /// During `AwaitingSecondPlayer` the first keyboard already holds slot 1,
    /// even though its keys are not relayed yet.
    pub fn player_of(&self, device: DeviceId) -> Option<Player> {
        match self.state {
            PairingState::Idle => None,
            PairingState::AwaitingSecondPlayer { player1 } => {
                (device == player1).then_some(Player::One)
            }
            PairingState::Paired { player1, player2 } => {
                if device == player1 {
                    Some(Player::One)
                } else if device == player2 {
                    Some(Player::Two)
                } else {
                    None
                }
            }
        }
    }

    /// Feeds one transition through the state machine.
    pub fn observe(&mut self, transition: &KeyTransition) -> RoutingDecision {
        let is_pairing_press = transition.pressed && transition.code == self.pairing_key;

        match self.state {
            PairingState::Idle if is_pairing_press => {
                self.state = PairingState::AwaitingSecondPlayer {
                    player1: transition.device,
                };
                RoutingDecision::Consumed
            }
            PairingState::AwaitingSecondPlayer { player1 }
                if is_pairing_press && transition.device != player1 =>
            {
                self.state = PairingState::Paired {
                    player1,
                    player2: transition.device,
                };
                RoutingDecision::Consumed
            }
            PairingState::Idle | PairingState::AwaitingSecondPlayer { .. } => {
                trace!(
                    device = %transition.device,
                    code = transition.code,
                    "transition dropped while pairing"
                );
                RoutingDecision::Drop
            }
            PairingState::Paired { .. } => match self.player_of(transition.device) {
                Some(player) => RoutingDecision::Forward(player),
                None => {
                    trace!(device = %transition.device, "transition from unpaired device dropped");
                    RoutingDecision::Drop
                }
            },
        }
    }
}

impl Default for PairingCoordinator {
    fn default() -> Self {
        Self::new(VK_RETURN)
    }
}
