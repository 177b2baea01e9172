//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Locating `config.toml` in the platform-appropriate directory, or the
//!   file named by `KEYRELAY_CONFIG`.
//! - Providing sensible defaults when the file does not exist yet (first run).
//! - Converting the on-disk schema into the settings types the transport and
//!   dispatcher take.

pub mod config;
