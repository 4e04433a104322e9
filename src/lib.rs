//! Vallox bus: decoder and encoder for the Vallox ventilation control bus
//!
//! The library turns the raw, possibly corrupted byte stream of the RS-485 bus
//! shared by a ventilation unit and its control panels into telegrams, sensor
//! readings and status flags, and builds the telegrams a panel sends to ask
//! for or change a value.
pub mod core;
pub mod protocol;
pub mod transport;
mod util;

// Re-export commonly used items
pub use crate::core::{Address, BusConfig, ChecksumMismatch, Error, Result, VariableCode};
pub use crate::protocol::{BusEvent, BusObserver, ProtocolEngine, Telegram};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
