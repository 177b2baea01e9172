//! Application layer for the relay host.
//!
//! # What is the "application" layer? (for beginners)
//!
//! Use cases in this layer orchestrate the pure domain types from
//! `keyrelay_core` and talk to the outside world only through traits
//! (`DeviceNameLookup`, `Transport`).  They contain no OS calls, so every
//! piece here runs in unit tests with fakes.
//!
//! # Sub-modules
//!
//! - **`device_registry`** – caches a human-readable name per keyboard.
//!
//! - **`capture`** – runs on the capture thread: resolves names, feeds the
//!   pairing coordinator, and enqueues forwarded transitions.
//!
//! - **`event_channel`** – the single-producer / single-consumer queue
//!   between the capture thread and the dispatch thread.
//!
//! - **`dispatch`** – runs on the dispatch thread: encodes packets and
//!   writes them to the serial transport.
//!
//! - **`relay`** – one session end to end: starts the input source, spawns
//!   the capture and dispatch threads, and shuts both down in order.

pub mod capture;
pub mod device_registry;
pub mod dispatch;
pub mod event_channel;
pub mod relay;
