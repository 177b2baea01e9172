//! Per-device keyboard capture.
//!
//! On Windows, this registers for Raw Input on a hidden message-only window
//! running its own message loop thread.  Every `WM_INPUT` is decoded into a
//! [`KeyTransition`] tagged with the originating keyboard and sent through a
//! channel; the capture thread consumes that channel as a
//! [`KeyTransitionStream`].
//!
//! # Why not a keyboard hook?
//!
//! Low-level hooks and ordinary window messages merge all keyboards into one
//! stream.  Raw Input is the only Windows API that reports the physical
//! device handle with each key edge, even when the application has no focus.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows tests to inject synthetic transitions
//! (see [`mock::MockInputSource`]) without any platform dependency.

use std::sync::mpsc;

use keyrelay_core::KeyTransition;

use crate::application::device_registry::{DeviceNameLookup, NameLookupError};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// The input source used by the binary on this platform.
#[cfg(target_os = "windows")]
pub type PlatformInputSource = windows::WindowsRawInputSource;

/// The input source used by the binary on this platform.
#[cfg(not(target_os = "windows"))]
pub type PlatformInputSource = UnsupportedInputSource;

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to register for raw keyboard input: {0}")]
    RegistrationFailed(String),
    #[error("input source has already been started")]
    AlreadyStarted,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Lazy, blocking, non-restartable sequence of key transitions.
///
/// `next()` blocks until the platform delivers the next edge and returns
/// `None` once the source has been stopped.
#[derive(Debug)]
pub struct KeyTransitionStream {
    rx: mpsc::Receiver<KeyTransition>,
}

impl KeyTransitionStream {
    pub fn new(rx: mpsc::Receiver<KeyTransition>) -> Self {
        Self { rx }
    }
}

impl Iterator for KeyTransitionStream {
    type Item = KeyTransition;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

/// Trait abstracting per-device key transition production.
///
/// The production implementation uses Windows Raw Input; tests use
/// [`mock::MockInputSource`].
pub trait InputSource: DeviceNameLookup {
    /// Registers with the platform and returns the transition stream.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if registration fails.  The caller must treat
    /// this as fatal: without registration no input will ever arrive.
    fn start(&self) -> Result<KeyTransitionStream, CaptureError>;

    /// Stops delivery; the stream ends after any already-captured edges.
    fn stop(&self);
}

/// Stand-in for platforms without a per-device keyboard API.
#[derive(Debug, Default)]
pub struct UnsupportedInputSource;

impl DeviceNameLookup for UnsupportedInputSource {
    fn device_name(&self, _device: keyrelay_core::DeviceId) -> Result<String, NameLookupError> {
        Err(NameLookupError::Platform(std::env::consts::OS.to_string()))
    }
}

impl InputSource for UnsupportedInputSource {
    fn start(&self) -> Result<KeyTransitionStream, CaptureError> {
        Err(CaptureError::UnsupportedPlatform(format!(
            "per-device keyboard capture is not available on {}",
            std::env::consts::OS
        )))
    }

    fn stop(&self) {}
}
