use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// A bus participant address
///
/// The address space is only partially named; unnamed values are still valid
/// addresses and are labelled with their decimal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u8);

impl Address {
    /// Broadcast to all mainboards
    pub const MAINBOARDS: Address = Address(0x10);
    /// The master mainboard
    pub const MASTER: Address = Address(0x11);
    /// Broadcast to all control panels
    pub const PANELS: Address = Address(0x20);
    pub const PANEL1: Address = Address(0x21);
    pub const PANEL2: Address = Address(0x22);
    pub const PANEL3: Address = Address(0x23);
    pub const PANEL4: Address = Address(0x24);
    pub const PANEL5: Address = Address(0x25);
    pub const PANEL6: Address = Address(0x26);
    pub const PANEL7: Address = Address(0x27);
    /// Long-range network bridge
    pub const LON: Address = Address(0x28);
    pub const PANEL8: Address = Address(0x29);

    /// Creates an address from its raw byte
    pub fn new(value: u8) -> Self {
        Address(value)
    }

    /// Returns the raw address byte
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the well-known name of this address, if it has one
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Address::MAINBOARDS => "Mainboards",
            Address::MASTER => "Master",
            Address::PANELS => "Panels",
            Address::PANEL1 => "Panel1",
            Address::PANEL2 => "Panel2",
            Address::PANEL3 => "Panel3",
            Address::PANEL4 => "Panel4",
            Address::PANEL5 => "Panel5",
            Address::PANEL6 => "Panel6",
            Address::PANEL7 => "Panel7",
            Address::LON => "LON",
            Address::PANEL8 => "Panel8",
            _ => return None,
        };
        Some(name)
    }

    /// Human-readable label: the well-known name or the decimal value
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.0.to_string(),
        }
    }

    /// Whether this address lies in the control panel range (0x21-0x29)
    pub fn is_panel(&self) -> bool {
        (Address::PANEL1.0..=Address::PANEL8.0).contains(&self.0)
    }
}

impl From<u8> for Address {
    fn from(value: u8) -> Self {
        Address(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Identifies a polled or reported quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableCode(pub u8);

impl VariableCode {
    pub const FAN_SPEED: VariableCode = VariableCode(0x29);
    /// Higher of the two humidity sensor readings
    pub const HUMIDITY: VariableCode = VariableCode(0x2A);
    pub const CO2_HIGH: VariableCode = VariableCode(0x2B);
    pub const CO2_LOW: VariableCode = VariableCode(0x2C);
    pub const HUMIDITY_SENSOR1: VariableCode = VariableCode(0x2F);
    pub const HUMIDITY_SENSOR2: VariableCode = VariableCode(0x30);
    pub const TEMP_OUTSIDE: VariableCode = VariableCode(0x32);
    pub const TEMP_EXHAUST: VariableCode = VariableCode(0x33);
    pub const TEMP_INSIDE: VariableCode = VariableCode(0x34);
    pub const TEMP_INCOMING: VariableCode = VariableCode(0x35);
    /// Polled cyclically by the panels, meaning undocumented
    pub const PING: VariableCode = VariableCode(0x71);
    pub const RESUME_BUS: VariableCode = VariableCode(0x8F);
    /// Broadcast twice before the CO2 sensor takes over the wire
    pub const SUSPEND_BUS: VariableCode = VariableCode(0x91);
    pub const SELECT: VariableCode = VariableCode(0xA3);
    pub const HEATING_SET_POINT: VariableCode = VariableCode(0xA4);
    pub const FAN_SPEED_MAX: VariableCode = VariableCode(0xA5);
    pub const SERVICE_REMINDER: VariableCode = VariableCode(0xA6);
    pub const PRE_HEATING_SET_POINT: VariableCode = VariableCode(0xA7);
    /// Supply fan stops below this temperature
    pub const INPUT_FAN_STOP: VariableCode = VariableCode(0xA8);
    pub const FAN_SPEED_MIN: VariableCode = VariableCode(0xA9);
    pub const PROGRAM: VariableCode = VariableCode(0xAA);
    pub const BASIC_HUMIDITY_LEVEL: VariableCode = VariableCode(0xAE);
    /// Heat recovery cell bypass set point
    pub const HRC_BYPASS: VariableCode = VariableCode(0xAF);
    pub const DC_FAN_INPUT_ADJUSTMENT: VariableCode = VariableCode(0xB0);
    pub const DC_FAN_OUTPUT_ADJUSTMENT: VariableCode = VariableCode(0xB1);
    /// Defrosting starts when exhaust air drops below this temperature
    pub const CELL_DEFROSTING: VariableCode = VariableCode(0xB2);
    pub const CO2_SET_POINT_UPPER: VariableCode = VariableCode(0xB3);
    pub const CO2_SET_POINT_LOWER: VariableCode = VariableCode(0xB4);
    pub const PROGRAM2: VariableCode = VariableCode(0xB5);

    /// Returns the raw code byte
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for VariableCode {
    fn from(value: u8) -> Self {
        VariableCode(value)
    }
}

/// Configuration for a bus monitor node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Serial device path
    pub port: String,
    /// Line speed; the bus runs 8N1 without flow control
    pub baud_rate: u32,
    /// Address this node transmits as
    #[serde(serialize_with = "super::serde::serialize_address")]
    #[serde(deserialize_with = "super::serde::deserialize_address")]
    pub local_address: Address,
    /// Serial read timeout
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub read_timeout: Duration,
    /// Capacity of the async event channel
    pub event_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            port: super::DEFAULT_PORT.to_string(),
            baud_rate: super::DEFAULT_BAUD_RATE,
            local_address: Address::PANEL2,
            read_timeout: Duration::from_millis(100),
            event_capacity: 256,
        }
    }
}

impl BusConfig {
    /// Checks the configuration for values the bus cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(Error::config("serial port path is empty"));
        }
        if self.baud_rate == 0 {
            return Err(Error::config("baud rate must be non-zero"));
        }
        if self.event_capacity == 0 {
            return Err(Error::config("event capacity must be non-zero"));
        }
        if !self.local_address.is_panel() {
            return Err(Error::config(format!(
                "local address {:#04x} is outside the panel range 0x21-0x29",
                self.local_address.0
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_labels() {
        assert_eq!(Address::MASTER.label(), "Master");
        assert_eq!(Address::LON.label(), "LON");
        assert_eq!(Address::PANEL8.label(), "Panel8");
        assert_eq!(Address(0x42).label(), "66");
        assert_eq!(Address(0x42).to_string(), "66");
        assert_eq!(Address::PANELS.to_string(), "Panels");
    }

    #[test]
    fn test_panel_range() {
        assert!(Address::PANEL1.is_panel());
        assert!(Address::LON.is_panel());
        assert!(Address::PANEL8.is_panel());
        assert!(!Address::PANELS.is_panel());
        assert!(!Address::MASTER.is_panel());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = BusConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.local_address, Address::PANEL2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = BusConfig::default();
        config.local_address = Address::MASTER;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = BusConfig::default();
        config.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = BusConfig::default();
        config.port.clear();
        assert!(config.validate().is_err());
    }
}
