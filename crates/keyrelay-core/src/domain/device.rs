//! Device identity and key transitions.
//!
//! # Why a device id at all? (for beginners)
//!
//! The usual keyboard APIs merge every attached keyboard into one stream of
//! key presses: pressing `A` on keyboard 1 and on keyboard 2 looks identical.
//! Low-level input APIs (Windows Raw Input) additionally report *which*
//! physical device produced the event via an opaque handle.  [`DeviceId`]
//! wraps that handle so the rest of the system can compare devices without
//! knowing anything about the platform.

use std::fmt;

/// Opaque identifier of one physical keyboard.
///
/// Stable for the lifetime of the process only; the OS may hand out a
/// different value after a replug or reboot.  Equality-comparable and
/// hashable, but intentionally not ordered: there is no meaningful "first"
/// keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Wraps a raw platform handle value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw platform handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One press or release edge of one key on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    /// Keyboard that produced the edge.
    pub device: DeviceId,
    /// Platform key code (Windows virtual-key code on Windows).
    pub code: u16,
    /// `true` for key-down, `false` for key-up.
    pub pressed: bool,
}

impl KeyTransition {
    /// Creates a key-down transition.
    pub const fn press(device: DeviceId, code: u16) -> Self {
        Self {
            device,
            code,
            pressed: true,
        }
    }

    /// Creates a key-up transition.
    pub const fn release(device: DeviceId, code: u16) -> Self {
        Self {
            device,
            code,
            pressed: false,
        }
    }
}
