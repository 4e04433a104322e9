//! Transport module
//!
//! Byte I/O around the protocol engine: an async connection over any tokio
//! byte stream and a blocking adapter for a local serial port. Neither touches
//! protocol state except through [`ProtocolEngine`](crate::protocol::ProtocolEngine).

pub mod connection;
pub mod serial;

pub use self::connection::{BusCommand, BusConnection, BusHandle};
pub use self::serial::SerialBus;
