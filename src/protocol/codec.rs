use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::Error;
use super::message::SyncEvent;
use super::sync::FrameSynchronizer;
use super::telegram::Telegram;

/// Telegram codec for framed bus I/O
///
/// Decoding drains the read buffer into a [`FrameSynchronizer`] one byte at a
/// time and yields each synchronizer event; the partial window lives in the
/// codec, so the read buffer is always fully consumed. Encoding writes the 6
/// wire bytes of a telegram.
#[derive(Debug, Clone, Default)]
pub struct TelegramCodec {
    synchronizer: FrameSynchronizer,
}

impl TelegramCodec {
    /// Creates a new telegram codec
    pub fn new() -> Self {
        TelegramCodec::default()
    }

    /// Bytes of an incomplete telegram held back for the next read
    pub fn pending(&self) -> &[u8] {
        self.synchronizer.pending()
    }
}

impl Decoder for TelegramCodec {
    type Item = SyncEvent;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(event) = self.synchronizer.push_byte(byte) {
                return Ok(Some(event));
            }
        }

        // Need more data to complete the window
        Ok(None)
    }
}

impl Encoder<Telegram> for TelegramCodec {
    type Error = Error;

    fn encode(&mut self, item: Telegram, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.to_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, VariableCode};
    use crate::protocol::telegram::{build_poll_request, encode};
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn test_codec_round_trip() {
        let mut codec = TelegramCodec::new();
        let mut bytes = BytesMut::new();

        let telegram = build_poll_request(Address::PANEL2, VariableCode::FAN_SPEED);

        // Encode
        codec.encode(telegram, &mut bytes).unwrap();
        assert_eq!(&bytes[..], &telegram.to_bytes());

        // Decode
        let decoded = codec.decode(&mut bytes).unwrap();
        assert_eq!(decoded, Some(SyncEvent::FrameAccepted(telegram)));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_codec_partial_reads() {
        let mut codec = TelegramCodec::new();
        let telegram = encode(Address::MASTER, Address::PANELS, 0x2A, 0x40);
        let wire = telegram.to_bytes();

        let mut first = BytesMut::from(&wire[..4]);
        assert_eq!(codec.decode(&mut first).unwrap(), None);
        assert!(first.is_empty());
        assert_eq!(codec.pending(), &wire[..4]);

        let mut second = BytesMut::from(&wire[4..]);
        assert_eq!(
            codec.decode(&mut second).unwrap(),
            Some(SyncEvent::FrameAccepted(telegram))
        );
    }

    #[test]
    fn test_codec_leaves_rest_for_next_call() {
        let mut codec = TelegramCodec::new();
        let a = encode(Address::MASTER, Address::PANELS, 0x33, 0x80);
        let b = encode(Address::MASTER, Address::PANELS, 0x34, 0x81);

        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&a.to_bytes());
        buffer.extend_from_slice(&b.to_bytes());

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(SyncEvent::FrameAccepted(a)));
        assert_eq!(buffer.len(), 6);
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(SyncEvent::FrameAccepted(b)));
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[tokio::test]
    async fn test_framed_read_over_fragmented_stream() {
        let telegram = encode(Address::MASTER, Address::PANELS, 0x29, 0x1F);
        let wire = telegram.to_bytes();

        let io = tokio_test::io::Builder::new()
            .read(&[0x77])
            .read(&wire[..2])
            .read(&wire[2..])
            .build();

        let events: Vec<_> = FramedRead::new(io, TelegramCodec::new())
            .map(|r| r.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SyncEvent::ByteDropped { byte: 0x77, .. }));
        assert_eq!(events[1], SyncEvent::FrameAccepted(telegram));
    }
}
