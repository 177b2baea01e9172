//! Mock input source for testing.
//!
//! Allows tests to inject synthetic [`KeyTransition`]s from any number of
//! fake keyboards without a running Windows message loop.

use std::collections::HashMap;
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex, PoisonError,
};

use keyrelay_core::{DeviceId, KeyTransition};

use super::{CaptureError, InputSource, KeyTransitionStream};
use crate::application::device_registry::{DeviceNameLookup, NameLookupError};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<KeyTransition>>>>,
    names: HashMap<DeviceId, String>,
    name_queries: Arc<Mutex<u32>>,
    fail_start: bool,
}

impl MockInputSource {
    /// Creates a new mock input source with no named devices.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            names: HashMap::new(),
            name_queries: Arc::new(Mutex::new(0)),
            fail_start: false,
        }
    }

    /// Registers a device name returned by [`DeviceNameLookup::device_name`].
    pub fn with_device(mut self, device: DeviceId, name: &str) -> Self {
        self.names.insert(device, name.to_string());
        self
    }

    /// Makes [`InputSource::start`] fail as if registration were refused.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Returns `true` between `start()` and `stop()`.
    pub fn is_started(&self) -> bool {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Injects a synthetic transition, as if captured from hardware.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject(&self, transition: KeyTransition) {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ref sender) = *guard {
            sender
                .send(transition)
                .expect("stream has been dropped; keep it alive while injecting");
        } else {
            panic!("MockInputSource::inject called before start()");
        }
    }

    /// Injects every transition of `script` in order.
    pub fn inject_all<I: IntoIterator<Item = KeyTransition>>(&self, script: I) {
        for transition in script {
            self.inject(transition);
        }
    }

    /// Returns the number of name lookups performed.
    pub fn name_query_count(&self) -> u32 {
        *self.name_queries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceNameLookup for MockInputSource {
    fn device_name(&self, device: DeviceId) -> Result<String, NameLookupError> {
        *self.name_queries.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.names
            .get(&device)
            .cloned()
            .ok_or(NameLookupError::UnknownDevice(device))
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<KeyTransitionStream, CaptureError> {
        if self.fail_start {
            return Err(CaptureError::RegistrationFailed(
                "mock registration refused".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        Ok(KeyTransitionStream::new(rx))
    }

    fn stop(&self) {
        // Drop the sender to end the stream
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KBD: DeviceId = DeviceId::from_raw(0x10);

    #[test]
    fn test_mock_input_source_starts_and_receives_events() {
        // Arrange
        let source = MockInputSource::new();
        let mut stream = source.start().expect("start should succeed");

        // Act
        source.inject(KeyTransition::press(KBD, 0x41));

        // Assert
        assert_eq!(stream.next(), Some(KeyTransition::press(KBD, 0x41)));
    }

    #[test]
    fn test_mock_input_source_stop_ends_stream() {
        // Arrange
        let source = MockInputSource::new();
        let mut stream = source.start().expect("start should succeed");
        source.inject(KeyTransition::press(KBD, 0x41));

        // Act
        source.stop();

        // Assert – buffered edge is still delivered, then the stream ends
        assert!(stream.next().is_some());
        assert_eq!(stream.next(), None);
        assert!(!source.is_started());
    }

    #[test]
    fn test_mock_input_source_resolves_registered_names() {
        let source = MockInputSource::new().with_device(KBD, "left keyboard");

        assert_eq!(source.device_name(KBD).unwrap(), "left keyboard");
        assert!(source.device_name(DeviceId::from_raw(0x99)).is_err());
        assert_eq!(source.name_query_count(), 2);
    }

    #[test]
    fn test_mock_input_source_can_refuse_start() {
        let source = MockInputSource::new().failing_start();
        assert!(matches!(
            source.start(),
            Err(CaptureError::RegistrationFailed(_))
        ));
    }

    #[test]
    #[should_panic(expected = "before start()")]
    fn test_inject_before_start_panics() {
        MockInputSource::new().inject(KeyTransition::press(KBD, 0x41));
    }
}
