//! Event channel between the capture thread and the dispatch thread.
//!
//! # Why a queue? (for beginners)
//!
//! The capture thread sits inside the platform's input delivery path.  If it
//! blocked on the serial port, every keyboard on the machine would stall.
//! Instead it pushes already-routed events onto this queue and returns
//! immediately; the dispatch thread pops them and does the slow I/O.
//!
//! # Backpressure
//!
//! The queue is unbounded: `push` never blocks and never drops.  Key edges
//! arrive at human speed, so memory growth only happens if the serial side
//! stops draining, and then the dispatcher fails loudly anyway.
//!
//! # Closing
//!
//! Dropping the [`EventSender`] closes the channel.  The receiver still
//! yields everything already queued and only then reports
//! [`RecvOutcome::Closed`].

use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use keyrelay_core::{KeyTransition, Player};
use thiserror::Error;

/// A transition that the pairing coordinator routed to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardedEvent {
    pub player: Player,
    pub transition: KeyTransition,
}

/// The consumer has gone away; the event was not queued.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("event channel closed: dispatcher is no longer running")]
pub struct ChannelClosed;

/// Result of a bounded wait on the receiver.
#[derive(Debug, PartialEq, Eq)]
pub enum RecvOutcome {
    Event(ForwardedEvent),
    TimedOut,
    Closed,
}

/// Creates a connected sender/receiver pair.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer half, owned by the capture thread.
///
/// Deliberately not `Clone`: the channel has exactly one producer.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::Sender<ForwardedEvent>,
}

impl EventSender {
    /// Enqueues an event without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] if the receiver has been dropped.
    pub fn push(&self, event: ForwardedEvent) -> Result<(), ChannelClosed> {
        self.tx.send(event).map_err(|_| ChannelClosed)
    }
}

/// Consumer half, owned by the dispatch thread.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<ForwardedEvent>,
}

impl EventReceiver {
    /// Blocks until an event is available; `None` once closed and empty.
    pub fn recv(&self) -> Option<ForwardedEvent> {
        self.rx.recv().ok()
    }

    /// Blocks for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> RecvOutcome {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => RecvOutcome::Event(event),
            Err(RecvTimeoutError::Timeout) => RecvOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => RecvOutcome::Closed,
        }
    }

    /// Returns a queued event without waiting.
    pub fn try_recv(&self) -> Option<ForwardedEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrelay_core::DeviceId;

    fn event(code: u16) -> ForwardedEvent {
        ForwardedEvent {
            player: Player::One,
            transition: KeyTransition::press(DeviceId::from_raw(1), code),
        }
    }

    #[test]
    fn test_events_arrive_in_fifo_order() {
        // Arrange
        let (tx, rx) = event_channel();

        // Act
        for code in 0..10 {
            tx.push(event(code)).expect("receiver alive");
        }

        // Assert
        for code in 0..10 {
            assert_eq!(rx.recv(), Some(event(code)));
        }
    }

    #[test]
    fn test_queued_events_survive_sender_drop() {
        let (tx, rx) = event_channel();
        tx.push(event(1)).unwrap();
        tx.push(event(2)).unwrap();
        drop(tx);

        assert_eq!(rx.recv(), Some(event(1)));
        assert_eq!(rx.recv_timeout(Duration::from_millis(10)), RecvOutcome::Event(event(2)));
        assert_eq!(rx.recv_timeout(Duration::from_millis(10)), RecvOutcome::Closed);
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_recv_timeout_on_empty_open_channel_times_out() {
        let (_tx, rx) = event_channel();
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)), RecvOutcome::TimedOut);
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_push_after_receiver_drop_reports_closed() {
        let (tx, rx) = event_channel();
        drop(rx);
        assert_eq!(tx.push(event(1)), Err(ChannelClosed));
    }

    #[test]
    fn test_push_from_another_thread_is_received() {
        let (tx, rx) = event_channel();
        let producer = std::thread::spawn(move || {
            for code in 0..100 {
                tx.push(event(code)).unwrap();
            }
        });
        producer.join().unwrap();

        let received: Vec<u16> = std::iter::from_fn(|| rx.recv())
            .map(|e| e.transition.code)
            .collect();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }
}
