//! Integration tests for a full relay session.
//!
//! These tests run `run_relay` end-to-end with the mock input source feeding
//! the real capture and dispatch threads, and the loopback controller standing
//! in for the serial line.

use std::sync::Arc;
use std::time::Duration;

use keyrelay_core::keymap::VK_RETURN;
use keyrelay_core::{DeviceId, KeyTransition, Player};
use keyrelay_host::application::dispatch::DispatchSettings;
use keyrelay_host::application::relay::{run_relay, RelayOptions, RelayReport};
use keyrelay_host::infrastructure::input_source::mock::MockInputSource;
use keyrelay_host::infrastructure::transport::{LoopbackTransport, ReceivedPackets};
use tokio::sync::oneshot;

const D1: DeviceId = DeviceId::from_raw(0x1001);
const D2: DeviceId = DeviceId::from_raw(0x1002);
const D3: DeviceId = DeviceId::from_raw(0x1003);

fn options() -> RelayOptions {
    RelayOptions {
        pairing_key: VK_RETURN,
        dispatch: DispatchSettings {
            settle_delay: Duration::ZERO,
            readback_len: 3,
            poll_interval: Duration::from_millis(5),
        },
    }
}

fn named_source() -> Arc<MockInputSource> {
    Arc::new(
        MockInputSource::new()
            .with_device(D1, "left keyboard")
            .with_device(D2, "right keyboard"),
    )
}

/// Runs one session: injects `script`, waits until the loopback controller
/// has `expected_packets`, then requests shutdown.
async fn run_script(
    source: Arc<MockInputSource>,
    script: Vec<KeyTransition>,
    expected_packets: usize,
) -> (RelayReport, ReceivedPackets) {
    let transport = LoopbackTransport::new();
    let received = transport.received_packets();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let session = tokio::spawn(run_relay(
        Arc::clone(&source),
        Box::new(transport),
        options(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    while !source.is_started() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    source.inject_all(script);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while received.lock().unwrap().len() < expected_packets {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for packets"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    stop_tx.send(()).expect("session still running");
    let report = session
        .await
        .expect("session task not cancelled")
        .expect("session ends cleanly");
    (report, received)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pair_then_press_relays_two_packets() {
    // Arrange
    let source = named_source();
    let script = vec![
        KeyTransition::press(D1, VK_RETURN),
        KeyTransition::press(D2, VK_RETURN),
        KeyTransition::press(D1, 0x41),
        KeyTransition::release(D1, 0x41),
    ];

    // Act
    let (report, received) = run_script(Arc::clone(&source), script, 2).await;

    // Assert
    let bytes: Vec<[u8; 3]> = received.lock().unwrap().iter().map(|p| p.to_bytes()).collect();
    assert_eq!(bytes, vec![[1, 0x41, 1], [1, 0x41, 0]]);
    assert_eq!(report.capture.forwarded, 2);
    assert_eq!(report.capture.consumed, 2);
    assert!(report.capture.paired);
    assert_eq!(report.dispatch.packets_sent, 2);
    assert_eq!(report.dispatch.echo_bytes, 6, "loopback echoes every packet");
}

#[tokio::test]
async fn test_unpaired_noise_and_third_keyboard_are_not_relayed() {
    // Arrange
    let source = named_source();
    let script = vec![
        // Before pairing: nothing forwarded
        KeyTransition::press(D1, 0x57),
        KeyTransition::release(D1, 0x57),
        KeyTransition::press(D1, VK_RETURN),
        KeyTransition::press(D1, VK_RETURN),
        KeyTransition::press(D2, VK_RETURN),
        // After pairing: third keyboard ignored
        KeyTransition::press(D3, 0x20),
        KeyTransition::press(D2, 0x26),
        KeyTransition::release(D2, 0x26),
    ];

    // Act
    let (report, received) = run_script(Arc::clone(&source), script, 2).await;

    // Assert
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|p| p.player == Player::Two));
    assert_eq!(received[0].to_bytes(), [2, 0x26, 1]);
    assert_eq!(received[1].to_bytes(), [2, 0x26, 0]);
    assert_eq!(report.capture.observed, 8);
    assert_eq!(report.capture.dropped, 4);
}

#[tokio::test]
async fn test_wide_key_codes_are_truncated_on_the_wire() {
    let source = named_source();
    let script = vec![
        KeyTransition::press(D1, VK_RETURN),
        KeyTransition::press(D2, VK_RETURN),
        KeyTransition::press(D2, 0x141),
    ];

    let (_, received) = run_script(source, script, 1).await;

    assert_eq!(received.lock().unwrap()[0].to_bytes(), [2, 0x41, 1]);
}

#[tokio::test]
async fn test_unnamed_keyboards_still_pair() {
    // Name lookup fails for every device; pairing must not depend on it.
    let source = Arc::new(MockInputSource::new());
    let script = vec![
        KeyTransition::press(D3, VK_RETURN),
        KeyTransition::press(D1, VK_RETURN),
        KeyTransition::press(D3, 0x41),
    ];

    let (report, received) = run_script(Arc::clone(&source), script, 1).await;

    assert!(report.capture.paired);
    assert_eq!(received.lock().unwrap()[0].to_bytes(), [1, 0x41, 1]);
    assert!(source.name_query_count() >= 2);
}
