//! Coinville domain types — pure shared layer, no simulation logic.
pub mod config;
pub mod stop;

pub use config::{ConfigError, SimConfig};
pub use stop::{StopHandle, StopSignal};
