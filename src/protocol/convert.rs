//! Byte to physical value conversions
//!
//! Temperatures go through a 256-entry sensor curve, fan speeds through an
//! 8-entry thermometer code, and the three status bytes split into records.

use serde::{Deserialize, Serialize};

/// Sensor curve in °C indexed by the raw byte
///
/// Saturates at -74 below and clamps to 100 above, so it cannot be inverted.
#[rustfmt::skip]
pub const TEMPERATURE_TABLE: [i8; 256] = [
    -74, -70, -66, -62, -59, -56, -54, -52,
    -50, -48, -47, -46, -44, -43, -42, -41,
    -40, -39, -38, -37, -36, -35, -34, -33,
    -33, -32, -31, -30, -30, -29, -28, -28,
    -27, -27, -26, -25, -25, -24, -24, -23,
    -23, -22, -22, -21, -21, -20, -20, -19,
    -19, -19, -18, -18, -17, -17, -16, -16,
    -16, -15, -15, -14, -14, -14, -13, -13,
    -12, -12, -12, -11, -11, -11, -10, -10,
    -9, -9, -9, -8, -8, -8, -7, -7,
    -7, -6, -6, -6, -5, -5, -5, -4,
    -4, -4, -3, -3, -3, -2, -2, -2,
    -1, -1, -1, -1, 0, 0, 0, 1,
    1, 1, 2, 2, 2, 3, 3, 3,
    4, 4, 4, 5, 5, 5, 5, 6,
    6, 6, 7, 7, 7, 8, 8, 8,
    9, 9, 9, 10, 10, 10, 11, 11,
    11, 12, 12, 12, 13, 13, 13, 14,
    14, 14, 15, 15, 15, 16, 16, 16,
    17, 17, 18, 18, 18, 19, 19, 19,
    20, 20, 21, 21, 21, 22, 22, 22,
    23, 23, 24, 24, 24, 25, 25, 26,
    26, 27, 27, 27, 28, 28, 29, 29,
    30, 30, 31, 31, 32, 32, 33, 33,
    34, 34, 35, 35, 36, 36, 37, 37,
    38, 38, 39, 40, 40, 41, 41, 42,
    43, 43, 44, 45, 45, 46, 47, 48,
    49, 49, 50, 51, 52, 53, 53, 54,
    55, 56, 57, 59, 60, 61, 62, 63,
    65, 66, 68, 69, 71, 73, 75, 77,
    79, 81, 82, 86, 90, 93, 97, 100,
    100, 100, 100, 100, 100, 100, 100, 100,
];

/// Raw fan speed bytes for levels 1 through 8
pub const FAN_SPEED_TABLE: [u8; 8] = [0x01, 0x03, 0x07, 0x0F, 0x1F, 0x3F, 0x7F, 0xFF];

/// Level reported for a fan speed byte outside [`FAN_SPEED_TABLE`]
pub const FAN_SPEED_UNKNOWN: u8 = 0;

/// Temperature in °C for a raw sensor byte
pub fn decode_temperature(raw: u8) -> i8 {
    TEMPERATURE_TABLE[raw as usize]
}

/// Fan speed level 1-8, or [`FAN_SPEED_UNKNOWN`] when `raw` is not in the table
pub fn decode_fan_speed(raw: u8) -> u8 {
    FAN_SPEED_TABLE
        .iter()
        .position(|&b| b == raw)
        .map(|i| i as u8 + 1)
        .unwrap_or(FAN_SPEED_UNKNOWN)
}

/// Raw byte for a fan speed level; `None` outside 1-8
pub fn encode_fan_speed(level: u8) -> Option<u8> {
    let index = (level as usize).checked_sub(1)?;
    FAN_SPEED_TABLE.get(index).copied()
}

#[inline]
fn bit(byte: u8, n: u8) -> bool {
    byte & (1 << n) != 0
}

/// Decoded Select status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectFlags {
    pub power: bool,
    pub co2_adjust: bool,
    pub humidity_adjust: bool,
    pub heating: bool,
    pub filter_guard_indicator: bool,
    pub heating_indicator: bool,
    pub fault_indicator: bool,
    pub service_reminder_indicator: bool,
}

impl From<u8> for SelectFlags {
    fn from(raw: u8) -> Self {
        SelectFlags {
            power: bit(raw, 0),
            co2_adjust: bit(raw, 1),
            humidity_adjust: bit(raw, 2),
            heating: bit(raw, 3),
            filter_guard_indicator: bit(raw, 4),
            heating_indicator: bit(raw, 5),
            fault_indicator: bit(raw, 6),
            service_reminder_indicator: bit(raw, 7),
        }
    }
}

/// What the boost switch on the panel does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostSwitchMode {
    Fireplace,
    Boost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiatorType {
    Electric,
    Water,
}

/// Decoded Program status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramFlags {
    /// CO2 and %RH adjustment interval in minutes (0-15)
    pub adjustment_interval_minutes: u8,
    /// Automatic basic humidity level seeker
    pub humidity_level_seeker: bool,
    pub boost_switch_mode: BoostSwitchMode,
    pub radiator_type: RadiatorType,
    pub cascade_adjust: bool,
}

impl From<u8> for ProgramFlags {
    fn from(raw: u8) -> Self {
        ProgramFlags {
            adjustment_interval_minutes: raw & 0x0F,
            humidity_level_seeker: bit(raw, 4),
            boost_switch_mode: if bit(raw, 5) {
                BoostSwitchMode::Boost
            } else {
                BoostSwitchMode::Fireplace
            },
            radiator_type: if bit(raw, 6) {
                RadiatorType::Water
            } else {
                RadiatorType::Electric
            },
            cascade_adjust: bit(raw, 7),
        }
    }
}

/// When the maximum fan speed limit applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxSpeedLimitMode {
    WithAdjustment,
    Always,
}

/// Decoded Program2 status byte; bits 1-7 are unused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program2Flags {
    pub max_speed_limit_mode: MaxSpeedLimitMode,
}

impl From<u8> for Program2Flags {
    fn from(raw: u8) -> Self {
        let max_speed_limit_mode = if bit(raw, 0) {
            MaxSpeedLimitMode::Always
        } else {
            MaxSpeedLimitMode::WithAdjustment
        };
        Program2Flags { max_speed_limit_mode }
    }
}
