//! Infrastructure layer for the relay host.
//!
//! Contains OS-facing adapters: per-device keyboard capture, the serial
//! transport to the controller, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyrelay_core`; the domain types in `keyrelay_core` never depend on it.

pub mod input_source;
pub mod storage;
pub mod transport;
