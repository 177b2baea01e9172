//! DeviceRegistry: lazily resolved, cached keyboard names.
//!
//! Names are purely diagnostic ("Player 1 = \\?\HID#VID_046D&PID_C31C…").
//! A failed lookup must never stall capture, so it degrades to a placeholder.

use std::collections::HashMap;
use std::sync::Arc;

use keyrelay_core::DeviceId;
use thiserror::Error;
use tracing::{debug, warn};

/// Error returned by a [`DeviceNameLookup`].
#[derive(Debug, Error)]
pub enum NameLookupError {
    #[error("device {0} is not known to the input source")]
    UnknownDevice(DeviceId),
    #[error("platform error: {0}")]
    Platform(String),
}

/// Resolves a device id to a human-readable name.
///
/// Every input source implements this; tests use a counting fake.
pub trait DeviceNameLookup: Send + Sync {
    fn device_name(&self, device: DeviceId) -> Result<String, NameLookupError>;
}

/// In-memory cache of device names, keyed by [`DeviceId`].
///
/// The cache never evicts: the number of entries is bounded by the number of
/// keyboards ever attached during this run.
pub struct DeviceRegistry {
    names: HashMap<DeviceId, String>,
    lookup: Arc<dyn DeviceNameLookup>,
}

impl DeviceRegistry {
    pub fn new(lookup: Arc<dyn DeviceNameLookup>) -> Self {
        Self {
            names: HashMap::new(),
            lookup,
        }
    }

    /// Returns the name for `device`, querying the lookup on first sighting.
    pub fn resolve(&mut self, device: DeviceId) -> &str {
        let lookup = &self.lookup;
        self.names.entry(device).or_insert_with(|| {
            match lookup.device_name(device) {
                Ok(name) => {
                    debug!(%device, %name, "new keyboard seen");
                    name
                }
                Err(e) => {
                    warn!(%device, "device name lookup failed: {e}");
                    placeholder_name(device)
                }
            }
        })
        .as_str()
    }

    /// Returns the cached name without querying.
    #[cfg(test)]
    pub(crate) fn cached(&self, device: DeviceId) -> Option<&str> {
        self.names.get(&device).map(String::as_str)
    }

    /// Number of distinct devices seen so far.
    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Name used when the platform cannot tell us what a device is called.
pub fn placeholder_name(device: DeviceId) -> String {
    format!("unknown device {device}")
}
