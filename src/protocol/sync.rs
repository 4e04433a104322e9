//! Frame synchronizer
//!
//! The bus has no frame delimiter, so frame boundaries are found by checksum
//! alone. Bytes collect in a 6-byte window; a window that checksums is
//! accepted and the window restarts empty, a window that does not loses its
//! oldest byte and the search continues one byte further along the stream.
//!
//! A stream can coincidentally checksum on a wrong boundary. The protocol
//! offers nothing stronger, so such a false lock is accepted as-is and
//! corrected by the next failing window.

use tracing::{debug, trace};

use crate::core::TELEGRAM_LENGTH;
use crate::util::hex_bytes;
use super::message::SyncEvent;
use super::telegram::validate;

/// Recovers telegram boundaries from an unframed byte stream
#[derive(Debug, Clone, Default)]
pub struct FrameSynchronizer {
    window: [u8; TELEGRAM_LENGTH],
    len: usize,
}

impl FrameSynchronizer {
    /// Creates a synchronizer with an empty window
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one byte
    ///
    /// Returns `None` while the window is still filling, otherwise exactly one
    /// event for the completed window.
    pub fn push_byte(&mut self, byte: u8) -> Option<SyncEvent> {
        self.window[self.len] = byte;
        self.len += 1;

        if self.len < TELEGRAM_LENGTH {
            return None;
        }

        match validate(&self.window) {
            Ok(telegram) => {
                trace!("Accepted telegram {}", telegram);
                self.len = 0;
                Some(SyncEvent::FrameAccepted(telegram))
            }
            Err(mismatch) => {
                let dropped = self.window[0];
                debug!(
                    "Wrong checksum on {}: expected {:02X}, received {:02X}, dropped byte {:02X}",
                    hex_bytes(&self.window),
                    mismatch.expected,
                    mismatch.received,
                    dropped
                );
                self.window.copy_within(1.., 0);
                self.len -= 1;
                Some(SyncEvent::ByteDropped { byte: dropped, mismatch })
            }
        }
    }

    /// Consumes a batch of bytes in order, collecting the events they produce
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<SyncEvent> {
        bytes.iter().filter_map(|&b| self.push_byte(b)).collect()
    }

    /// Bytes currently waiting in the window
    pub fn pending(&self) -> &[u8] {
        &self.window[..self.len]
    }

    /// Discards any partial window
    pub fn reset(&mut self) {
        self.len = 0;
    }
}
