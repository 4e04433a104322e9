use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{Address, ChecksumMismatch, VariableCode};
use super::telegram::Telegram;
use super::variables::DecodedValue;

/// Outcome of pushing one byte into the frame synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A checksum-valid 6-byte window, whatever its domain
    FrameAccepted(Telegram),
    /// The oldest byte of a failing window was discarded
    ByteDropped {
        /// The discarded byte
        byte: u8,
        /// Why the window was rejected
        mismatch: ChecksumMismatch,
    },
}

/// A variable addressed to this node changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableUpdate {
    pub code: VariableCode,
    /// Registry name, "unknown" for unregistered codes
    pub name: &'static str,
    pub raw: u8,
    pub decoded: DecodedValue,
    /// Number of updates seen for this code, this one included
    pub counter: u64,
    #[serde(serialize_with = "serialize_label")]
    pub sender: Address,
    #[serde(serialize_with = "serialize_label")]
    pub receiver: Address,
    pub received_at: DateTime<Utc>,
}

fn serialize_label<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&address.label())
}

/// What an observed telegram asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficAction {
    /// Poll request for a variable
    Poll { variable: VariableCode },
    /// Value set or reported for a variable
    Set { variable: VariableCode, value: u8 },
}

impl From<&Telegram> for TrafficAction {
    fn from(telegram: &Telegram) -> Self {
        if telegram.is_poll() {
            TrafficAction::Poll { variable: telegram.variable() }
        } else {
            TrafficAction::Set {
                variable: telegram.variable(),
                value: telegram.value(),
            }
        }
    }
}

impl fmt::Display for TrafficAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficAction::Poll { variable } => write!(f, "get {}", variable),
            TrafficAction::Set { variable, value } => {
                write!(f, "set {} = {:#04x}", variable, value)
            }
        }
    }
}

/// Bus traffic that produced no variable update
///
/// Covers frames from other domains and telegrams addressed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawTraffic {
    pub domain: u8,
    #[serde(serialize_with = "serialize_label")]
    pub sender: Address,
    #[serde(serialize_with = "serialize_label")]
    pub receiver: Address,
    pub action: TrafficAction,
}

impl From<&Telegram> for RawTraffic {
    fn from(telegram: &Telegram) -> Self {
        RawTraffic {
            domain: telegram.domain(),
            sender: telegram.sender(),
            receiver: telegram.receiver(),
            action: TrafficAction::from(telegram),
        }
    }
}

impl fmt::Display for RawTraffic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}: {}", self.sender, self.receiver, self.action)
    }
}

/// Everything the engine reports to its observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BusEvent {
    FrameAccepted(Telegram),
    ByteDropped {
        byte: u8,
        mismatch: ChecksumMismatch,
    },
    VariableUpdated(VariableUpdate),
    RawTraffic(RawTraffic),
}

impl From<SyncEvent> for BusEvent {
    fn from(event: SyncEvent) -> Self {
        match event {
            SyncEvent::FrameAccepted(telegram) => BusEvent::FrameAccepted(telegram),
            SyncEvent::ByteDropped { byte, mismatch } => BusEvent::ByteDropped { byte, mismatch },
        }
    }
}

impl BusEvent {
    /// Hands this event to the matching observer method
    pub fn notify<O: BusObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            BusEvent::FrameAccepted(telegram) => observer.on_frame_accepted(telegram),
            BusEvent::ByteDropped { byte, mismatch } => observer.on_byte_dropped(*byte, mismatch),
            BusEvent::VariableUpdated(update) => observer.on_variable_updated(update),
            BusEvent::RawTraffic(traffic) => observer.on_raw_traffic(traffic),
        }
    }
}

/// Receives engine events; every method defaults to ignoring the event
pub trait BusObserver {
    fn on_frame_accepted(&mut self, _telegram: &Telegram) {}

    fn on_byte_dropped(&mut self, _byte: u8, _mismatch: &ChecksumMismatch) {}

    fn on_variable_updated(&mut self, _update: &VariableUpdate) {}

    fn on_raw_traffic(&mut self, _traffic: &RawTraffic) {}
}

/// Collects events in arrival order
impl BusObserver for Vec<BusEvent> {
    fn on_frame_accepted(&mut self, telegram: &Telegram) {
        self.push(BusEvent::FrameAccepted(*telegram));
    }

    fn on_byte_dropped(&mut self, byte: u8, mismatch: &ChecksumMismatch) {
        self.push(BusEvent::ByteDropped { byte, mismatch: *mismatch });
    }

    fn on_variable_updated(&mut self, update: &VariableUpdate) {
        self.push(BusEvent::VariableUpdated(update.clone()));
    }

    fn on_raw_traffic(&mut self, traffic: &RawTraffic) {
        self.push(BusEvent::RawTraffic(*traffic));
    }
}
