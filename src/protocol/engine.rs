use chrono::Utc;
use tracing::debug;

use crate::core::{Address, BusConfig, Error, Result, VariableCode};
use super::convert::encode_fan_speed;
use super::message::{BusEvent, BusObserver, RawTraffic, SyncEvent, VariableUpdate};
use super::state::{EngineSnapshot, TrafficTable, VariableState, VariableTable};
use super::sync::FrameSynchronizer;
use super::telegram::{build_poll_request, build_set_command, Telegram};
use super::variables::decode;

/// Protocol engine: bytes in, events out, telegrams for outgoing commands
///
/// The engine assumes a single writer. Callers running it behind async I/O
/// must serialize `push_*` calls themselves; see
/// [`BusConnection`](crate::transport::BusConnection) for one way to do that.
#[derive(Debug, Clone)]
pub struct ProtocolEngine {
    /// Address this node listens and transmits as
    local_address: Address,
    synchronizer: FrameSynchronizer,
    variables: VariableTable,
    traffic: TrafficTable,
}

impl ProtocolEngine {
    /// Creates an engine for a node at `local_address`
    pub fn new(local_address: Address) -> Self {
        ProtocolEngine {
            local_address,
            synchronizer: FrameSynchronizer::new(),
            variables: VariableTable::new(),
            traffic: TrafficTable::new(),
        }
    }

    /// Creates an engine from a validated configuration
    pub fn from_config(config: &BusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.local_address))
    }

    pub fn local_address(&self) -> Address {
        self.local_address
    }

    /// Feeds one byte and returns the events it produced, in order
    pub fn push_byte(&mut self, byte: u8) -> Vec<BusEvent> {
        match self.synchronizer.push_byte(byte) {
            Some(event) => self.handle_sync_event(event),
            None => Vec::new(),
        }
    }

    /// Feeds a batch of bytes in arrival order
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<BusEvent> {
        let mut events = Vec::new();
        for &b in bytes {
            events.extend(self.push_byte(b));
        }
        events
    }

    /// Feeds a batch of bytes and hands every resulting event to `observer`
    pub fn push_bytes_to<O: BusObserver + ?Sized>(&mut self, bytes: &[u8], observer: &mut O) {
        for &b in bytes {
            for event in self.push_byte(b) {
                event.notify(observer);
            }
        }
    }

    /// Processes an event from an external synchronizer, such as the one
    /// inside [`TelegramCodec`](super::codec::TelegramCodec)
    pub fn handle_sync_event(&mut self, event: SyncEvent) -> Vec<BusEvent> {
        match event {
            SyncEvent::FrameAccepted(telegram) => {
                let mut events = vec![BusEvent::FrameAccepted(telegram)];
                events.push(self.dispatch(&telegram));
                events
            }
            dropped @ SyncEvent::ByteDropped { .. } => vec![BusEvent::from(dropped)],
        }
    }

    /// Routes one checksum-valid telegram
    ///
    /// Traffic counters are always updated. Application telegrams for a
    /// locally relevant receiver update the variable named by their command
    /// byte; a poll request to such a receiver therefore records code 0x00,
    /// never the polled variable. Everything else comes back as raw traffic.
    pub fn dispatch(&mut self, telegram: &Telegram) -> BusEvent {
        let sender = telegram.sender();
        let receiver = telegram.receiver();
        self.traffic.record(sender, receiver);

        if !telegram.is_application() || !self.is_local_receiver(receiver) {
            let traffic = RawTraffic::from(telegram);
            debug!("Observed {} (domain {})", traffic, traffic.domain);
            return BusEvent::RawTraffic(traffic);
        }

        let code = VariableCode(telegram.command());
        let raw = telegram.value();
        let state = self.variables.record(code, raw, Utc::now());
        let decoded = decode(code, raw);
        debug!("{} = {} (raw {:#04x}, update {})", code, decoded, raw, state.counter);

        BusEvent::VariableUpdated(VariableUpdate {
            code,
            name: state.name,
            raw,
            decoded,
            counter: state.counter,
            sender,
            receiver,
            received_at: state.last_updated,
        })
    }

    /// Whether telegrams to `address` carry values this node keeps
    pub fn is_local_receiver(&self, address: Address) -> bool {
        address == Address::PANEL1
            || address == Address::PANEL8
            || address == Address::PANELS
            || address == self.local_address
    }

    pub fn variable(&self, code: VariableCode) -> Option<&VariableState> {
        self.variables.get(code)
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn traffic(&self) -> &TrafficTable {
        &self.traffic
    }

    /// Copies the current variable and traffic tables
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            variables: self.variables.iter().cloned().collect(),
            traffic: self.traffic.iter().cloned().collect(),
        }
    }

    /// Drops any partially received telegram, e.g. after reopening the port
    pub fn resync(&mut self) {
        self.synchronizer.reset();
    }

    /// Telegram asking the master to set `code` to `value`
    pub fn set_variable(&self, code: VariableCode, value: u8) -> Telegram {
        build_set_command(self.local_address, code, value)
    }

    /// Telegram asking the master for the value of `code`
    pub fn poll_variable(&self, code: VariableCode) -> Telegram {
        build_poll_request(self.local_address, code)
    }

    /// Telegram setting the fan speed to `level` (1-8)
    pub fn set_fan_speed(&self, level: u8) -> Result<Telegram> {
        let raw = encode_fan_speed(level).ok_or_else(|| {
            Error::invalid_argument(format!("fan speed level {} is outside 1-8", level))
        })?;
        Ok(self.set_variable(VariableCode::FAN_SPEED, raw))
    }
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        ProtocolEngine::new(Address::PANEL2)
    }
}
