//! Domain layer: pure input-relay rules with no OS dependencies.
//!
//! - **`device`** – opaque device identity and the key transition value.
//! - **`pairing`** – the one-time ritual that assigns keyboards to players.

pub mod device;
pub mod pairing;
