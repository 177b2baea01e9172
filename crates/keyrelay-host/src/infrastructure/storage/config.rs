//! TOML-based configuration for the relay host.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\KeyRelay\config.toml`
//! - Linux:    `~/.config/keyrelay/config.toml`
//! - macOS:    `~/Library/Application Support/KeyRelay/config.toml`
//!
//! Setting `KEYRELAY_CONFIG` to a file path overrides the lookup.
//!
//! # Example
//!
//! ```toml
//! [relay]
//! pairing_key = "Enter"
//! log_level = "info"
//!
//! [serial]
//! port = "COM3"
//! baud_rate = 115200
//!
//! [transport]
//! kind = "serial"
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, and every
//! section with `#[serde(default)]`, so an empty file (or none at all) yields
//! the same configuration as [`AppConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use keyrelay_core::keymap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dispatch::DispatchSettings;
use crate::infrastructure::transport::SerialSettings;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "KEYRELAY_CONFIG";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `relay.pairing_key` is neither a known key name nor a number.
    #[error("unrecognised pairing key {0:?}")]
    InvalidPairingKey(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Pairing and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// Key that claims a player slot, by name (`"Enter"`) or code (`"0x0D"`).
    #[serde(default = "default_pairing_key")]
    pub pairing_key: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Serial line to the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Pause after opening the port before the first write.
    #[serde(default = "default_open_settle_ms")]
    pub open_settle_ms: u64,
}

/// Dispatcher timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Bytes read back after each write; `0` disables read-back.
    #[serde(default = "default_readback_len")]
    pub readback_len: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Which transport carries packets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Real serial port.
    #[default]
    Serial,
    /// In-process simulated controller.
    Loopback,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_pairing_key() -> String {
    "Enter".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> String {
    "COM3".to_string()
}
fn default_baud_rate() -> u32 {
    115_200
}
fn default_read_timeout_ms() -> u64 {
    100
}
fn default_open_settle_ms() -> u64 {
    10
}
fn default_settle_delay_ms() -> u64 {
    2
}
fn default_readback_len() -> usize {
    3
}
fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pairing_key: default_pairing_key(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            open_settle_ms: default_open_settle_ms(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            readback_len: default_readback_len(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Parses `relay.pairing_key` into a virtual-key code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPairingKey`] if the value is not a known
    /// key name or a number.
    pub fn pairing_key_code(&self) -> Result<u16, ConfigError> {
        keymap::parse_key(&self.relay.pairing_key)
            .ok_or_else(|| ConfigError::InvalidPairingKey(self.relay.pairing_key.clone()))
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
            open_settle: Duration::from_millis(self.serial.open_settle_ms),
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            settle_delay: Duration::from_millis(self.dispatch.settle_delay_ms),
            readback_len: self.dispatch.readback_len,
            // A zero poll interval would spin the dispatch thread.
            poll_interval: Duration::from_millis(self.dispatch.poll_interval_ms.max(1)),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// `KEYRELAY_CONFIG` wins when set; otherwise the platform directory is used.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(explicit));
    }
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from the resolved config path, returning
/// `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`; a missing file yields the defaults.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves the platform config directory, including the `KeyRelay` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeyRelay"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyrelay"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeyRelay")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
