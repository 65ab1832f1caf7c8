//! # Packet
//!
//! The framing layer: a fixed 4-byte header followed by an opaque payload.
//!
//! ```text
//! [Kind(1)] [Length(3), big-endian] [Payload(Length)]
//! ```
//!
//! A Data packet's payload is conventionally a message buffer, but framing never
//! looks inside it. Composing the two layers is done by
//! [`MessageCodec`](crate::protocol::message::MessageCodec).

use crate::core::reader::ByteReader;
use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Header length in bytes
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 3-byte length field can describe
pub const MAX_PACKET_PAYLOAD: usize = 0x00FF_FFFF;

/// Packet kinds with their wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PacketKind {
    Handshake = 1,
    HandshakeAck = 2,
    Heartbeat = 3,
    Data = 4,
    Kick = 5,
}

impl PacketKind {
    #[inline]
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PacketKind::Handshake => "handshake",
            PacketKind::HandshakeAck => "handshake_ack",
            PacketKind::Heartbeat => "heartbeat",
            PacketKind::Data => "data",
            PacketKind::Kick => "kick",
        }
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(PacketKind::Handshake),
            2 => Ok(PacketKind::HandshakeAck),
            3 => Ok(PacketKind::Heartbeat),
            4 => Ok(PacketKind::Data),
            5 => Ok(PacketKind::Kick),
            other => Err(ProtocolError::InvalidPacketKind(other)),
        }
    }
}

/// One framed unit on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketKind,
    pub payload: Vec<u8>,
}

impl Packet {
    #[must_use]
    pub fn new(kind: PacketKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    #[must_use]
    pub fn data(payload: Vec<u8>) -> Self {
        Self::new(PacketKind::Data, payload)
    }

    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(PacketKind::Heartbeat, Vec::new())
    }

    #[must_use]
    pub fn handshake_ack() -> Self {
        Self::new(PacketKind::HandshakeAck, Vec::new())
    }

    /// Size of this packet once framed.
    #[inline]
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Write the header for a payload of `len` bytes into `out`.
    pub(crate) fn write_header(
        kind: PacketKind,
        len: usize,
        out: &mut [u8; HEADER_SIZE],
    ) -> Result<()> {
        if len > MAX_PACKET_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge(len));
        }
        out[0] = kind.as_u8();
        out[1] = (len >> 16) as u8;
        out[2] = (len >> 8) as u8;
        out[3] = len as u8;
        Ok(())
    }

    /// Parse a header, returning the kind and declared payload length.
    pub(crate) fn read_header(reader: &mut ByteReader<'_>) -> Result<(PacketKind, usize)> {
        let kind = PacketKind::try_from(reader.read_u8()?)?;
        let len = reader.read_u24_be()? as usize;
        Ok((kind, len))
    }

    /// Serialize the packet to bytes.
    ///
    /// # Errors
    /// Returns `PayloadTooLarge` if the payload exceeds the 24-bit length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = [0u8; HEADER_SIZE];
        Self::write_header(self.kind, self.payload.len(), &mut header)?;

        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&header);
        out.extend_from_slice(&self.payload);
        trace!(kind = self.kind.name(), len = self.payload.len(), "Packet encoded");
        Ok(out)
    }

    /// Parse one packet from the start of `buf`. Bytes after the frame are ignored.
    ///
    /// # Errors
    /// - `TruncatedInput` if `buf` is shorter than the header plus declared length
    /// - `InvalidPacketKind` if the kind byte is not a known packet kind
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(buf);
        let packet = Self::read_from(&mut reader)?;
        trace!(kind = packet.kind.name(), len = packet.payload.len(), "Packet decoded");
        Ok(packet)
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let (kind, len) = Self::read_header(reader)?;
        let payload = reader.read_bytes(len)?.to_vec();
        Ok(Self { kind, payload })
    }

    /// Split a buffer holding several back-to-back packets.
    ///
    /// Fails on the first malformed or partial frame; use
    /// [`PacketCodec`](crate::core::codec::PacketCodec) to accumulate partial
    /// frames from a stream.
    pub fn decode_all(buf: &[u8]) -> Result<Vec<Self>> {
        let mut reader = ByteReader::new(buf);
        let mut packets = Vec::new();
        while reader.remaining() > 0 {
            packets.push(Self::read_from(&mut reader)?);
        }
        debug!(count = packets.len(), bytes = buf.len(), "Decoded packet batch");
        Ok(packets)
    }
}
