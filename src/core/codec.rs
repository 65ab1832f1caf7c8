//! # Stream Codec
//!
//! Tokio codec for framing [`Packet`]s over a byte stream.
//!
//! The decoder waits until a whole frame is buffered before consuming anything,
//! so it can be driven by `FramedRead` over any `AsyncRead`. Oversized frames are
//! rejected from the header alone, before their payload is buffered.

use crate::core::packet::{Packet, HEADER_SIZE, MAX_PACKET_PAYLOAD};
use crate::core::reader::ByteReader;
use crate::error::{ProtocolError, Result};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_payload_size: usize,
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PACKET_PAYLOAD,
        }
    }
}

impl PacketCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit accepted payloads to `max` bytes (clamped to the 24-bit maximum).
    #[must_use]
    pub fn with_max_payload_size(max: usize) -> Self {
        Self {
            max_payload_size: max.min(MAX_PACKET_PAYLOAD),
        }
    }

    #[must_use]
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let (kind, len) = Packet::read_header(&mut ByteReader::new(&src[..HEADER_SIZE]))?;
        if len > self.max_payload_size {
            warn!(
                kind = kind.name(),
                len,
                max = self.max_payload_size,
                "Rejecting oversized frame"
            );
            return Err(ProtocolError::PayloadTooLarge(len));
        }

        let total = HEADER_SIZE + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(len).to_vec();
        trace!(kind = kind.name(), len, "Frame decoded");
        Ok(Some(Packet { kind, payload }))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        if item.payload.len() > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge(item.payload.len()));
        }
        let mut header = [0u8; HEADER_SIZE];
        Packet::write_header(item.kind, item.payload.len(), &mut header)?;

        dst.reserve(item.encoded_len());
        dst.put_slice(&header);
        dst.put_slice(&item.payload);
        Ok(())
    }
}
