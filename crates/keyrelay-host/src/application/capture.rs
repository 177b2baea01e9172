//! CapturePipeline: the per-transition work done on the capture thread.
//!
//! For every key edge the input source delivers, in order:
//!
//! 1. Resolve the device name (cached after first sighting).
//! 2. Feed the edge to the [`PairingCoordinator`].
//! 3. Announce pairing progress on `Consumed`, enqueue on `Forward`,
//!    ignore on `Drop`.
//!
//! Nothing here blocks on I/O; the serial port belongs to the dispatch thread.

use keyrelay_core::{KeyTransition, PairingCoordinator, PairingState, RoutingDecision};
use tracing::{debug, info};

use super::device_registry::DeviceRegistry;
use super::event_channel::{ChannelClosed, EventSender, ForwardedEvent};

/// Counters reported when the capture loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    pub observed: u64,
    pub consumed: u64,
    pub forwarded: u64,
    pub dropped: u64,
    /// Distinct keyboards seen, paired or not.
    pub devices: usize,
    pub paired: bool,
}

/// Owns the pairing coordinator, the device registry, and the producer half
/// of the event channel.
pub struct CapturePipeline {
    coordinator: PairingCoordinator,
    registry: DeviceRegistry,
    events: EventSender,
    summary: CaptureSummary,
}

impl CapturePipeline {
    pub fn new(
        coordinator: PairingCoordinator,
        registry: DeviceRegistry,
        events: EventSender,
    ) -> Self {
        Self {
            coordinator,
            registry,
            events,
            summary: CaptureSummary::default(),
        }
    }

    /// Returns the pairing coordinator (read-only).
    pub fn coordinator(&self) -> &PairingCoordinator {
        &self.coordinator
    }

    /// Returns the counters accumulated so far.
    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            paired: self.coordinator.is_paired(),
            devices: self.registry.len(),
            ..self.summary
        }
    }

    /// Handles one transition.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] if a forwarded event cannot be queued because
    /// the dispatcher has stopped.
    pub fn handle(&mut self, transition: KeyTransition) -> Result<RoutingDecision, ChannelClosed> {
        self.summary.observed += 1;
        self.registry.resolve(transition.device);

        let decision = self.coordinator.observe(&transition);
        match decision {
            RoutingDecision::Consumed => {
                self.summary.consumed += 1;
                self.announce_pairing_progress(transition);
            }
            RoutingDecision::Forward(player) => {
                self.events.push(ForwardedEvent { player, transition })?;
                self.summary.forwarded += 1;
            }
            RoutingDecision::Drop => {
                self.summary.dropped += 1;
            }
        }
        Ok(decision)
    }

    /// Consumes transitions until the sequence ends.
    ///
    /// Dropping `self` at the end closes the event channel, which lets the
    /// dispatcher drain and exit.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] if the dispatcher stops first.
    pub fn run<I>(mut self, transitions: I) -> Result<CaptureSummary, ChannelClosed>
    where
        I: IntoIterator<Item = KeyTransition>,
    {
        for transition in transitions {
            self.handle(transition)?;
        }
        let summary = self.summary();
        debug!(?summary, "input stream ended");
        Ok(summary)
    }

    fn announce_pairing_progress(&mut self, transition: KeyTransition) {
        let name = self.registry.resolve(transition.device);
        match self.coordinator.state() {
            PairingState::AwaitingSecondPlayer { .. } => {
                info!("Player 1 = {name}");
            }
            PairingState::Paired { .. } => {
                info!("Player 2 = {name}");
                info!("pairing complete; relaying both keyboards");
            }
            PairingState::Idle => {}
        }
    }
}
