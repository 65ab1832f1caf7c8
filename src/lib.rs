//! # pomelo-protocol
//!
//! Packet and message codec for the Pomelo game server wire protocol.
//!
//! The protocol has two layers. Packets frame the byte stream with a 4-byte
//! header; Data packets carry messages, which pack a kind, an optional id, an
//! optional route (literal or dictionary-coded) and an optionally gzipped body.
//!
//! ```text
//! Packet:  [Kind(1)] [Length(3)] [Payload(Length)]
//! Message: [Flags(1)] [Id(varint)]? [Code(2) | Len(1) Route]? [Body]
//! ```
//!
//! ## Example
//! ```rust
//! use pomelo_protocol::{Message, MessageCodec, Packet, PacketKind, RouteTable};
//! use std::sync::Arc;
//!
//! let routes = Arc::new(RouteTable::from_dict([("user.login", 1)]).unwrap());
//! let codec = MessageCodec::new(routes);
//!
//! let request = Message::request(1, "user.login", b"{\"id\":888}".to_vec())
//!     .with_route_compression(true)
//!     .with_gzip(true);
//! let wire = codec.to_packet(&request).unwrap().to_bytes().unwrap();
//!
//! let packet = Packet::from_bytes(&wire).unwrap();
//! assert_eq!(packet.kind, PacketKind::Data);
//! assert_eq!(codec.from_packet(&packet).unwrap(), request);
//! ```
//!
//! Transports, session lifecycle and route dispatch live outside this crate.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::core::codec::PacketCodec;
pub use crate::core::packet::{Packet, PacketKind};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::message::{Message, MessageCodec, MessageKind};
pub use crate::protocol::route::RouteTable;
