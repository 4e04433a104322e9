//! Protocol implementation module
//!
//! Telegram layout, checksum and addressing rules, the frame synchronizer,
//! the variable registry and the engine that ties them together.
//!
//! ```text
//! 01 21 11 00 A3 D6
//! |  |  |  |  |  |
//! |  |  |  |  |  checksum: sum of bytes 0-4 mod 256
//! |  |  |  |  poll: variable code, otherwise: value
//! |  |  |  poll: 00, otherwise: variable code
//! |  |  receiver
//! |  sender
//! domain, always 01 for application telegrams
//! ```

pub mod codec;
pub mod convert;
pub mod engine;
pub mod message;
pub mod state;
pub mod sync;
pub mod telegram;
pub mod variables;

pub use self::codec::TelegramCodec;
pub use self::convert::{
    BoostSwitchMode, MaxSpeedLimitMode, Program2Flags, ProgramFlags, RadiatorType, SelectFlags,
};
pub use self::engine::ProtocolEngine;
pub use self::message::{BusEvent, BusObserver, RawTraffic, SyncEvent, TrafficAction, VariableUpdate};
pub use self::state::{EngineSnapshot, TrafficStat, VariableState};
pub use self::sync::FrameSynchronizer;
pub use self::telegram::Telegram;
pub use self::variables::{BusControl, DecodeKind, DecodedValue};
