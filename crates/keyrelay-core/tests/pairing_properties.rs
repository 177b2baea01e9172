//! Property-style tests for the pairing state machine and packet codec.
//!
//! These drive `PairingCoordinator` through short event sequences over a
//! small universe of devices and key codes, checking the guarantees the
//! relay depends on.

use keyrelay_core::keymap::VK_RETURN;
use keyrelay_core::{
    encode, DeviceId, KeyTransition, Packet, PairingCoordinator, PairingState, Player,
    RoutingDecision,
};

const DEVICES: [DeviceId; 3] = [
    DeviceId::from_raw(0x10),
    DeviceId::from_raw(0x20),
    DeviceId::from_raw(0x30),
];

/// A representative set of codes, including Enter and a code above 0xFF.
const CODES: [u16; 5] = [VK_RETURN, 0x20, 0x41, 0xFF, 0x141];

fn every_transition() -> Vec<KeyTransition> {
    let mut all = Vec::new();
    for &device in &DEVICES {
        for &code in &CODES {
            all.push(KeyTransition::press(device, code));
            all.push(KeyTransition::release(device, code));
        }
    }
    all
}

#[test]
fn test_only_two_distinct_enter_presses_reach_paired() {
    for first in every_transition() {
        for second in every_transition() {
            let mut coord = PairingCoordinator::default();
            coord.observe(&first);
            coord.observe(&second);

            let expected = first.pressed
                && first.code == VK_RETURN
                && second.pressed
                && second.code == VK_RETURN
                && first.device != second.device;

            assert_eq!(
                coord.is_paired(),
                expected,
                "sequence {first:?} then {second:?}"
            );
            if expected {
                assert_eq!(
                    coord.state(),
                    PairingState::Paired {
                        player1: first.device,
                        player2: second.device
                    }
                );
            }
        }
    }
}

#[test]
fn test_repeated_enter_from_player_one_is_idempotent() {
    let a = DEVICES[0];
    let mut coord = PairingCoordinator::default();
    coord.observe(&KeyTransition::press(a, VK_RETURN));

    for _ in 0..10 {
        assert_eq!(
            coord.observe(&KeyTransition::press(a, VK_RETURN)),
            RoutingDecision::Drop
        );
        assert_eq!(coord.state(), PairingState::AwaitingSecondPlayer { player1: a });
    }
}

#[test]
fn test_paired_routing_for_all_codes() {
    let [a, b, c] = DEVICES;
    let mut coord = PairingCoordinator::default();
    coord.observe(&KeyTransition::press(a, VK_RETURN));
    coord.observe(&KeyTransition::press(b, VK_RETURN));

    for code in 0..=0x1FFu16 {
        assert_eq!(
            coord.observe(&KeyTransition::press(a, code)),
            RoutingDecision::Forward(Player::One)
        );
        assert_eq!(
            coord.observe(&KeyTransition::release(a, code)),
            RoutingDecision::Forward(Player::One)
        );
        assert_eq!(
            coord.observe(&KeyTransition::press(b, code)),
            RoutingDecision::Forward(Player::Two)
        );
        assert_eq!(coord.observe(&KeyTransition::press(c, code)), RoutingDecision::Drop);
    }
    assert!(coord.is_paired(), "pairing must never change once reached");
}

#[test]
fn test_nothing_forwarded_before_pairing() {
    // Arrange – a noisy pre-pairing phase: every device mashes non-Enter keys,
    // player 1 claims its slot, then more noise from everyone.
    let mut coord = PairingCoordinator::default();
    let noise: Vec<KeyTransition> = every_transition()
        .into_iter()
        .filter(|t| t.code != VK_RETURN)
        .collect();

    // Act / Assert
    for t in &noise {
        assert_eq!(coord.observe(t), RoutingDecision::Drop, "{t:?} leaked while idle");
    }
    coord.observe(&KeyTransition::press(DEVICES[0], VK_RETURN));
    for t in &noise {
        let decision = coord.observe(t);
        assert_eq!(decision, RoutingDecision::Drop, "{t:?} leaked before pairing");
    }
}

#[test]
fn test_wire_examples() {
    assert_eq!(encode(Player::One, 0x57, true), [0x01, 0x57, 0x01]);
    assert_eq!(encode(Player::Two, 0x57, false), [0x02, 0x57, 0x00]);
    assert_eq!(encode(Player::One, 0x141, true), [0x01, 0x41, 0x01]);
}

#[test]
fn test_routing_then_encoding_matches_controller_decode() {
    // Arrange
    let [a, b, _] = DEVICES;
    let mut coord = PairingCoordinator::default();
    coord.observe(&KeyTransition::press(a, VK_RETURN));
    coord.observe(&KeyTransition::press(b, VK_RETURN));
    let t = KeyTransition::release(b, 0x26);

    // Act
    let RoutingDecision::Forward(player) = coord.observe(&t) else {
        panic!("paired device must be forwarded");
    };
    let bytes = Packet::from_transition(player, &t).to_bytes();

    // Assert
    assert_eq!(bytes, [0x02, 0x26, 0x00]);
    let decoded = Packet::decode(&bytes).expect("controller must accept the packet");
    assert_eq!(decoded.player, Player::Two);
}
