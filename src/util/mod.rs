//! Utility module
//!
//! Small formatting helpers shared by logging and `Display` impls.

use std::fmt::Write;

/// Formats bytes as space-separated upper-case hex pairs, e.g. `01 21 11 00 A3 D6`
pub fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", b);
    }
    out
}
