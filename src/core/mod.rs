//! Core types for the Vallox bus engine
//!
//! This module contains the error type, the address and variable code newtypes
//! and the bus configuration used throughout the library.

pub mod error;
pub mod serde;
pub mod types;

pub use self::error::{ChecksumMismatch, Error, Result};
pub use self::types::{Address, BusConfig, VariableCode};

/// Length of every telegram on the wire
pub const TELEGRAM_LENGTH: usize = 6;

/// Domain byte of application telegrams
pub const DOMAIN: u8 = 1;

/// Command byte marking a poll request
pub const POLL_COMMAND: u8 = 0x00;

/// Line speed of the bus
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial device opened when none is configured
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
