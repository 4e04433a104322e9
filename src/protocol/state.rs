use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{Address, VariableCode};
use super::variables::{decode, DecodedValue};

/// Last known value of one variable code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableState {
    pub code: VariableCode,
    /// Registry name, "unknown" for unregistered codes
    pub name: &'static str,
    /// Last received raw byte
    pub raw: u8,
    /// Updates received since the code was first seen
    pub counter: u64,
    pub last_updated: DateTime<Utc>,
}

impl VariableState {
    fn new(code: VariableCode, now: DateTime<Utc>) -> Self {
        VariableState {
            code,
            name: code.name(),
            raw: 0,
            counter: 0,
            last_updated: now,
        }
    }

    /// The raw byte run through the variable's decoding rule
    pub fn decoded(&self) -> DecodedValue {
        decode(self.code, self.raw)
    }
}

/// Telegram counts for one bus address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficStat {
    pub address: u8,
    /// Well-known name or the decimal address
    pub label: String,
    /// Telegrams sent by this address
    pub sent: u64,
    /// Telegrams addressed to this address
    pub received: u64,
}

impl TrafficStat {
    fn new(address: Address) -> Self {
        TrafficStat {
            address: address.value(),
            label: address.label(),
            sent: 0,
            received: 0,
        }
    }
}

/// Per-code variable states, created on first sighting and never removed
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    entries: BTreeMap<VariableCode, VariableState>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `raw` for `code` and bumps its counter
    pub fn record(&mut self, code: VariableCode, raw: u8, now: DateTime<Utc>) -> &VariableState {
        let state = self
            .entries
            .entry(code)
            .or_insert_with(|| VariableState::new(code, now));
        state.raw = raw;
        state.counter += 1;
        state.last_updated = now;
        state
    }

    pub fn get(&self, code: VariableCode) -> Option<&VariableState> {
        self.entries.get(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableState> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-address traffic counters, created on first sighting
#[derive(Debug, Clone, Default)]
pub struct TrafficTable {
    entries: BTreeMap<Address, TrafficStat>,
}

impl TrafficTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one telegram from `sender` to `receiver`
    pub fn record(&mut self, sender: Address, receiver: Address) {
        self.entries
            .entry(sender)
            .or_insert_with(|| TrafficStat::new(sender))
            .sent += 1;
        self.entries
            .entry(receiver)
            .or_insert_with(|| TrafficStat::new(receiver))
            .received += 1;
    }

    pub fn get(&self, address: Address) -> Option<&TrafficStat> {
        self.entries.get(&address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrafficStat> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only copy of the engine's collections
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineSnapshot {
    pub variables: Vec<VariableState>,
    pub traffic: Vec<TrafficStat>,
}

impl EngineSnapshot {
    pub fn variable(&self, code: VariableCode) -> Option<&VariableState> {
        self.variables.iter().find(|v| v.code == code)
    }

    pub fn traffic(&self, address: Address) -> Option<&TrafficStat> {
        self.traffic.iter().find(|t| t.address == address.value())
    }
}
