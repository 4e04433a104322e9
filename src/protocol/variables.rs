//! Variable registry
//!
//! One static table maps every known variable code to its display name and the
//! rule used to turn its raw byte into a value. Codes missing from the table
//! are labelled "unknown" and kept as opaque bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::VariableCode;
use super::convert::{
    decode_fan_speed, decode_temperature, Program2Flags, ProgramFlags, SelectFlags,
};

/// Name reported for codes missing from the registry
pub const UNKNOWN_NAME: &str = "unknown";

/// How a variable's raw byte is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeKind {
    /// Percentages, counters and set points in raw units
    Direct,
    Temperature,
    FanSpeed,
    Select,
    Program,
    Program2,
    /// CO2 sensor bus suspend/resume markers
    BusControl,
    Opaque,
}

/// Registry entry for one variable code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub code: VariableCode,
    pub name: &'static str,
    pub kind: DecodeKind,
}

const fn entry(code: VariableCode, name: &'static str, kind: DecodeKind) -> VariableDescriptor {
    VariableDescriptor { code, name, kind }
}

// Sorted by code for binary search.
static REGISTRY: &[VariableDescriptor] = &[
    entry(VariableCode::FAN_SPEED, "Fan speed", DecodeKind::FanSpeed),
    entry(VariableCode::HUMIDITY, "Humidity", DecodeKind::Direct),
    entry(VariableCode::CO2_HIGH, "CO2 high", DecodeKind::Direct),
    entry(VariableCode::CO2_LOW, "CO2 low", DecodeKind::Direct),
    entry(VariableCode::HUMIDITY_SENSOR1, "Humidity sensor 1", DecodeKind::Direct),
    entry(VariableCode::HUMIDITY_SENSOR2, "Humidity sensor 2", DecodeKind::Direct),
    entry(VariableCode::TEMP_OUTSIDE, "Temp outside", DecodeKind::Temperature),
    entry(VariableCode::TEMP_EXHAUST, "Temp exhaust", DecodeKind::Temperature),
    entry(VariableCode::TEMP_INSIDE, "Temp inside", DecodeKind::Temperature),
    entry(VariableCode::TEMP_INCOMING, "Temp incoming", DecodeKind::Temperature),
    entry(VariableCode::PING, "Ping", DecodeKind::Opaque),
    entry(VariableCode::RESUME_BUS, "Resume bus", DecodeKind::BusControl),
    entry(VariableCode::SUSPEND_BUS, "Suspend bus", DecodeKind::BusControl),
    entry(VariableCode::SELECT, "Select", DecodeKind::Select),
    entry(VariableCode::HEATING_SET_POINT, "Heating set point", DecodeKind::Temperature),
    entry(VariableCode::FAN_SPEED_MAX, "Fan speed max", DecodeKind::FanSpeed),
    entry(VariableCode::SERVICE_REMINDER, "Service reminder", DecodeKind::Direct),
    entry(VariableCode::PRE_HEATING_SET_POINT, "Pre heating set point", DecodeKind::Temperature),
    entry(VariableCode::INPUT_FAN_STOP, "Input fan stop temp", DecodeKind::Temperature),
    entry(VariableCode::FAN_SPEED_MIN, "Fan speed min", DecodeKind::FanSpeed),
    entry(VariableCode::PROGRAM, "Program", DecodeKind::Program),
    entry(VariableCode::BASIC_HUMIDITY_LEVEL, "Basic humidity level", DecodeKind::Direct),
    entry(VariableCode::HRC_BYPASS, "HRC bypass", DecodeKind::Temperature),
    entry(VariableCode::DC_FAN_INPUT_ADJUSTMENT, "DC fan input adjustment", DecodeKind::Direct),
    entry(VariableCode::DC_FAN_OUTPUT_ADJUSTMENT, "DC fan output adjustment", DecodeKind::Direct),
    entry(VariableCode::CELL_DEFROSTING, "Cell defrosting", DecodeKind::Temperature),
    entry(VariableCode::CO2_SET_POINT_UPPER, "CO2 set point upper", DecodeKind::Direct),
    entry(VariableCode::CO2_SET_POINT_LOWER, "CO2 set point lower", DecodeKind::Direct),
    entry(VariableCode::PROGRAM2, "Program2", DecodeKind::Program2),
];

/// Bus control markers broadcast around CO2 sensor traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusControl {
    Suspend,
    Resume,
}

/// A raw byte after its variable's decoding rule has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedValue {
    Direct(u8),
    /// Degrees Celsius
    Temperature(i8),
    /// Level 1-8, 0 when the byte is not a valid fan speed
    FanSpeed(u8),
    Select(SelectFlags),
    Program(ProgramFlags),
    Program2(Program2Flags),
    BusControl(BusControl),
    Opaque(u8),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Direct(v) => write!(f, "{}", v),
            DecodedValue::Temperature(t) => write!(f, "{}°C", t),
            DecodedValue::FanSpeed(0) => f.write_str("no speed"),
            DecodedValue::FanSpeed(level) => write!(f, "speed {}", level),
            DecodedValue::Select(flags) => write!(f, "{:?}", flags),
            DecodedValue::Program(flags) => write!(f, "{:?}", flags),
            DecodedValue::Program2(flags) => write!(f, "{:?}", flags),
            DecodedValue::BusControl(BusControl::Suspend) => f.write_str("suspend"),
            DecodedValue::BusControl(BusControl::Resume) => f.write_str("resume"),
            DecodedValue::Opaque(v) => write!(f, "{:#04x}", v),
        }
    }
}

/// Registry entry for `code`, if the code is known
pub fn lookup(code: VariableCode) -> Option<&'static VariableDescriptor> {
    REGISTRY
        .binary_search_by_key(&code, |d| d.code)
        .ok()
        .map(|i| &REGISTRY[i])
}

/// Decoding rule for `code`; unknown codes are opaque
pub fn kind_of(code: VariableCode) -> DecodeKind {
    lookup(code).map(|d| d.kind).unwrap_or(DecodeKind::Opaque)
}

/// Applies the decoding rule registered for `code` to `raw`
pub fn decode(code: VariableCode, raw: u8) -> DecodedValue {
    match kind_of(code) {
        DecodeKind::Direct => DecodedValue::Direct(raw),
        DecodeKind::Temperature => DecodedValue::Temperature(decode_temperature(raw)),
        DecodeKind::FanSpeed => DecodedValue::FanSpeed(decode_fan_speed(raw)),
        DecodeKind::Select => DecodedValue::Select(SelectFlags::from(raw)),
        DecodeKind::Program => DecodedValue::Program(ProgramFlags::from(raw)),
        DecodeKind::Program2 => DecodedValue::Program2(Program2Flags::from(raw)),
        DecodeKind::BusControl if code == VariableCode::SUSPEND_BUS => {
            DecodedValue::BusControl(BusControl::Suspend)
        }
        DecodeKind::BusControl => DecodedValue::BusControl(BusControl::Resume),
        DecodeKind::Opaque => DecodedValue::Opaque(raw),
    }
}

impl VariableCode {
    /// Registry name, or "unknown"
    pub fn name(&self) -> &'static str {
        lookup(*self).map(|d| d.name).unwrap_or(UNKNOWN_NAME)
    }

    pub fn is_known(&self) -> bool {
        lookup(*self).is_some()
    }
}

impl fmt::Display for VariableCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match lookup(*self) {
            Some(d) => f.write_str(d.name),
            None => write!(f, "{} ({:#04x})", UNKNOWN_NAME, self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::convert::MaxSpeedLimitMode;

    #[test]
    fn test_registry_sorted() {
        for pair in REGISTRY.windows(2) {
            assert!(pair[0].code < pair[1].code, "{:?} !< {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_known_names() {
        assert_eq!(VariableCode::SELECT.name(), "Select");
        assert_eq!(VariableCode::FAN_SPEED.name(), "Fan speed");
        assert_eq!(VariableCode::PROGRAM2.to_string(), "Program2");
        assert!(VariableCode::TEMP_INSIDE.is_known());
    }

    #[test]
    fn test_unknown_codes() {
        let code = VariableCode(0xC0);
        assert!(!code.is_known());
        assert_eq!(code.name(), UNKNOWN_NAME);
        assert_eq!(code.to_string(), "unknown (0xc0)");
        assert_eq!(kind_of(code), DecodeKind::Opaque);
        assert_eq!(decode(code, 0x03), DecodedValue::Opaque(0x03));
        assert!(lookup(VariableCode(0xFF)).is_none());
    }

    #[test]
    fn test_decode_rules() {
        assert_eq!(decode(VariableCode::TEMP_OUTSIDE, 0x00), DecodedValue::Temperature(-74));
        assert_eq!(decode(VariableCode::HRC_BYPASS, 0xFF), DecodedValue::Temperature(100));
        assert_eq!(decode(VariableCode::FAN_SPEED, 0x07), DecodedValue::FanSpeed(3));
        assert_eq!(decode(VariableCode::FAN_SPEED_MAX, 0x42), DecodedValue::FanSpeed(0));
        assert_eq!(decode(VariableCode::HUMIDITY, 0x55), DecodedValue::Direct(0x55));
        assert_eq!(
            decode(VariableCode::SELECT, 0x01),
            DecodedValue::Select(SelectFlags { power: true, ..SelectFlags::default() })
        );
        assert!(matches!(
            decode(VariableCode::PROGRAM2, 0x01),
            DecodedValue::Program2(Program2Flags { max_speed_limit_mode: MaxSpeedLimitMode::Always })
        ));
        assert_eq!(
            decode(VariableCode::SUSPEND_BUS, 0x00),
            DecodedValue::BusControl(BusControl::Suspend)
        );
        assert_eq!(
            decode(VariableCode::RESUME_BUS, 0x00),
            DecodedValue::BusControl(BusControl::Resume)
        );
    }

    #[test]
    fn test_decoded_value_display() {
        assert_eq!(DecodedValue::Temperature(-5).to_string(), "-5°C");
        assert_eq!(DecodedValue::FanSpeed(0).to_string(), "no speed");
        assert_eq!(DecodedValue::FanSpeed(4).to_string(), "speed 4");
        assert_eq!(DecodedValue::Opaque(0x0A).to_string(), "0x0a");
    }
}
