//! # Message Codec
//!
//! The payload layer carried inside Data packets.
//!
//! ## Wire Format
//! ```text
//! [Flags(1)] [Id(varint)]? [Code(2) | RouteLen(1) Route(RouteLen)]? [Body(..)]
//! ```
//!
//! The flags byte packs the route-compressed bit (bit 0), the message kind
//! (bits 1-3) and the compressed-body bit (bit 4). Requests and responses carry
//! an id; requests, notifies and pushes carry a route; the body takes whatever is
//! left of the buffer.
//!
//! ## Soft fallbacks
//! - A route asked to travel compressed but missing from the dictionary is sent
//!   as a literal string instead.
//! - A received route code the dictionary does not know decodes to an empty
//!   route rather than an error.
//!
//! ## Usage
//! ```rust
//! use pomelo_protocol::protocol::message::{Message, MessageCodec};
//! use pomelo_protocol::protocol::route::RouteTable;
//! use std::sync::Arc;
//!
//! let routes = Arc::new(RouteTable::from_dict([("user.login", 1)]).unwrap());
//! let codec = MessageCodec::new(routes);
//!
//! let msg = Message::push("user.login", b"{}".to_vec()).with_route_compression(true);
//! let bytes = codec.encode(&msg).unwrap();
//! assert_eq!(bytes, vec![0x07, 0x00, 0x01, b'{', b'}']);
//!
//! let decoded = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded.route, "user.login");
//! ```

use crate::core::packet::{Packet, PacketKind};
use crate::core::reader::ByteReader;
use crate::core::varint;
use crate::error::{ProtocolError, Result};
use crate::protocol::route::RouteTable;
use crate::utils::compression::BodyCompressor;
use crate::utils::metrics::Metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub const ROUTE_COMPRESSED_MASK: u8 = 0x01;
pub const KIND_MASK: u8 = 0x0e;
pub const BODY_COMPRESSED_MASK: u8 = 0x10;

/// Longest route that fits the 1-byte length prefix
pub const MAX_ROUTE_LEN: usize = u8::MAX as usize;

/// Message kinds with their wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    Request = 0,
    Notify = 1,
    Response = 2,
    Push = 3,
}

impl MessageKind {
    #[inline]
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Requests and responses carry an id.
    #[inline]
    #[must_use]
    pub fn has_id(self) -> bool {
        matches!(self, MessageKind::Request | MessageKind::Response)
    }

    /// Everything but a response carries a route.
    #[inline]
    #[must_use]
    pub fn has_route(self) -> bool {
        !matches!(self, MessageKind::Response)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Notify => "notify",
            MessageKind::Response => "response",
            MessageKind::Push => "push",
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MessageKind::Request),
            1 => Ok(MessageKind::Notify),
            2 => Ok(MessageKind::Response),
            3 => Ok(MessageKind::Push),
            other => Err(ProtocolError::InvalidMessageKind(other)),
        }
    }
}

/// An application message.
///
/// `id` is only meaningful for requests and responses and `route` only for
/// requests, notifies and pushes; the other is ignored on encode and left at its
/// default on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub id: u64,
    pub route: String,
    /// Ask for the route to travel as a dictionary code.
    pub compress_route: bool,
    /// Ask for the body to travel compressed.
    pub compress_gzip: bool,
    pub body: Vec<u8>,
}

impl Message {
    fn new(kind: MessageKind, id: u64, route: String, body: Vec<u8>) -> Self {
        Self {
            kind,
            id,
            route,
            compress_route: false,
            compress_gzip: false,
            body,
        }
    }

    pub fn request(id: u64, route: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(MessageKind::Request, id, route.into(), body)
    }

    pub fn notify(route: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(MessageKind::Notify, 0, route.into(), body)
    }

    pub fn response(id: u64, body: Vec<u8>) -> Self {
        Self::new(MessageKind::Response, id, String::new(), body)
    }

    pub fn push(route: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(MessageKind::Push, 0, route.into(), body)
    }

    #[must_use]
    pub fn with_route_compression(mut self, enabled: bool) -> Self {
        self.compress_route = enabled;
        self
    }

    #[must_use]
    pub fn with_gzip(mut self, enabled: bool) -> Self {
        self.compress_gzip = enabled;
        self
    }
}

/// Encoder/decoder for [`Message`]s against a shared route dictionary.
///
/// Cheap to clone; clones share the route table and metrics.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    routes: Arc<RouteTable>,
    compressor: BodyCompressor,
    metrics: Arc<Metrics>,
}

impl MessageCodec {
    /// Codec using gzip for bodies.
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self::with_compressor(routes, BodyCompressor::default())
    }

    pub fn with_compressor(routes: Arc<RouteTable>, compressor: BodyCompressor) -> Self {
        Self {
            routes,
            compressor,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn compressor(&self) -> &BodyCompressor {
        &self.compressor
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Encode a message.
    ///
    /// # Errors
    /// - `RouteTooLong` if a literal route exceeds 255 bytes
    /// - `CompressionFailure` if the body compressor fails
    pub fn encode(&self, msg: &Message) -> Result<Vec<u8>> {
        self.encode_inner(msg).inspect_err(|e| {
            self.metrics.encode_error();
            debug!(kind = msg.kind.name(), error = %e, "Message encode failed");
        })
    }

    fn encode_inner(&self, msg: &Message) -> Result<Vec<u8>> {
        let kind = msg.kind;

        let route_code = if kind.has_route() && msg.compress_route {
            let code = self.routes.compression_code(&msg.route);
            match code {
                Some(_) => self.metrics.route_compressed(),
                None => {
                    self.metrics.route_fallback();
                    debug!(route = %msg.route, "Route not in dictionary, sending literal");
                }
            }
            code
        } else {
            None
        };

        if kind.has_route() && route_code.is_none() && msg.route.len() > MAX_ROUTE_LEN {
            return Err(ProtocolError::RouteTooLong(msg.route.len()));
        }

        let body = if msg.compress_gzip {
            self.metrics.compression();
            self.compressor.compress(&msg.body)?
        } else {
            msg.body.clone()
        };

        let mut flags = kind.as_u8() << 1;
        if route_code.is_some() {
            flags |= ROUTE_COMPRESSED_MASK;
        }
        if msg.compress_gzip {
            flags |= BODY_COMPRESSED_MASK;
        }

        let mut out =
            Vec::with_capacity(1 + varint::MAX_VARINT_LEN + 1 + msg.route.len() + body.len());
        out.push(flags);

        if kind.has_id() {
            varint::encode_unsigned_into(msg.id, &mut out);
        }

        if kind.has_route() {
            match route_code {
                Some(code) => out.extend_from_slice(&code.to_be_bytes()),
                None => {
                    // length checked above
                    out.push(msg.route.len() as u8);
                    out.extend_from_slice(msg.route.as_bytes());
                }
            }
        }

        out.extend_from_slice(&body);

        self.metrics.message_encoded(out.len() as u64);
        trace!(
            kind = kind.name(),
            id = msg.id,
            route = %msg.route,
            route_compressed = route_code.is_some(),
            body_compressed = msg.compress_gzip,
            len = out.len(),
            "Message encoded"
        );
        Ok(out)
    }

    /// Decode a message.
    ///
    /// # Errors
    /// - `TruncatedInput` if any field runs past the end of `buf`
    /// - `InvalidMessageKind` if the flags carry a kind outside 0..=3
    /// - `MalformedVarint` if the id encoding is overlong
    /// - `InvalidRoute` if a literal route is not UTF-8
    /// - `DecompressionFailure` if a compressed body is corrupt
    pub fn decode(&self, buf: &[u8]) -> Result<Message> {
        self.decode_inner(buf).inspect_err(|e| {
            self.metrics.decode_error();
            debug!(len = buf.len(), error = %e, "Message decode failed");
        })
    }

    fn decode_inner(&self, buf: &[u8]) -> Result<Message> {
        let mut reader = ByteReader::new(buf);

        let flags = reader.read_u8()?;
        let kind = MessageKind::try_from((flags & KIND_MASK) >> 1)?;
        let compress_route = flags & ROUTE_COMPRESSED_MASK != 0;
        let compress_gzip = flags & BODY_COMPRESSED_MASK != 0;

        let id = if kind.has_id() {
            varint::read_unsigned(&mut reader)?
        } else {
            0
        };

        let route = if !kind.has_route() {
            String::new()
        } else if compress_route {
            let code = reader.read_u16_be()?;
            self.routes.route_for(code).unwrap_or_else(|| {
                self.metrics.unknown_route_code();
                warn!(code, "Unknown route code, decoding with empty route");
                String::new()
            })
        } else {
            let len = usize::from(reader.read_u8()?);
            let raw = reader.read_bytes(len)?;
            std::str::from_utf8(raw)
                .map_err(|_| ProtocolError::InvalidRoute)?
                .to_owned()
        };

        let raw_body = reader.read_rest();
        let body = if compress_gzip {
            self.metrics.decompression();
            self.compressor.decompress(raw_body)?
        } else {
            raw_body.to_vec()
        };

        self.metrics.message_decoded(buf.len() as u64);
        trace!(
            kind = kind.name(),
            id,
            route = %route,
            route_compressed = compress_route,
            body_compressed = compress_gzip,
            body_len = body.len(),
            "Message decoded"
        );

        Ok(Message {
            kind,
            id,
            route,
            compress_route,
            compress_gzip,
            body,
        })
    }

    /// Encode a message and wrap it in a Data packet.
    pub fn to_packet(&self, msg: &Message) -> Result<Packet> {
        Ok(Packet::data(self.encode(msg)?))
    }

    /// Decode the message carried by a Data packet.
    ///
    /// # Errors
    /// `UnexpectedPacket` if the packet is not a Data packet.
    pub fn from_packet(&self, packet: &Packet) -> Result<Message> {
        if packet.kind != PacketKind::Data {
            return Err(ProtocolError::UnexpectedPacket(packet.kind.as_u8()));
        }
        self.decode(&packet.payload)
    }
}
