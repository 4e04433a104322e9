use std::io;

use serde::Serialize;
use thiserror::Error;

/// A 6-byte window whose trailing byte is not the sum of the first five
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[error("Checksum mismatch: expected {expected:#04x}, received {received:#04x}")]
pub struct ChecksumMismatch {
    /// Checksum computed over bytes 0-4
    pub expected: u8,
    /// Checksum byte found at offset 5
    pub received: u8,
}

/// Custom error types for the bus engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error(transparent)]
    Checksum(#[from] ChecksumMismatch),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new serial port error
    pub fn serial(msg: impl Into<String>) -> Self {
        Error::Serial(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new channel closed error
    pub fn channel_closed(msg: impl Into<String>) -> Self {
        Error::ChannelClosed(msg.into())
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Error::Serial(err.to_string())
    }
}
