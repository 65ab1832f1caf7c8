//! # Error Types
//!
//! Error handling for the packet and message codecs.
//!
//! Every failure a codec call can report is a variant of [`ProtocolError`]. Codec
//! errors are local and non-fatal: the caller decides whether to drop the frame,
//! close the connection, or log and carry on.
//!
//! ## Error Categories
//! - **Structural Errors**: truncated buffers, malformed varints, oversized frames
//! - **Enumeration Errors**: packet or message kinds outside the wire enumeration
//! - **Route Errors**: literal routes longer than 255 bytes, non UTF-8 routes
//! - **Compression Errors**: the body compressor or decompressor failed
//! - **Ambient Errors**: I/O, configuration and handshake payload failures
//!
//! ## Example Usage
//! ```rust
//! use pomelo_protocol::core::packet::Packet;
//! use pomelo_protocol::error::ProtocolError;
//! use tracing::warn;
//!
//! match Packet::from_bytes(&[0x04, 0x00, 0x00, 0x09, 0x01]) {
//!     Ok(packet) => println!("decoded {:?}", packet.kind),
//!     Err(ProtocolError::TruncatedInput { needed, available }) => {
//!         warn!(needed, available, "Dropping partial frame");
//!     }
//!     Err(e) => warn!(error = %e, "Dropping bad frame"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Route table lock errors
    pub const ERR_ROUTE_TABLE_WRITE_LOCK: &str = "Failed to acquire write lock on route table";

    /// Configuration errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
    pub const ERR_DICT_PARSE: &str = "Failed to parse route dictionary";

    /// Handshake payload errors
    pub const ERR_HANDSHAKE_ENCODE: &str = "Failed to encode handshake payload";
    pub const ERR_HANDSHAKE_DECODE: &str = "Failed to decode handshake payload";
    pub const ERR_HANDSHAKE_REJECTED: &str = "Handshake rejected by server";
}

/// ProtocolError is the error type for all codec operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid message kind: {0}")]
    InvalidMessageKind(u8),

    #[error("Invalid packet kind: {0}")]
    InvalidPacketKind(u8),

    /// The buffer ended before the structure being decoded was complete.
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Malformed varint: continuation exceeds 64 bits")]
    MalformedVarint,

    #[error("Route too long: {0} bytes (maximum 255)")]
    RouteTooLong(usize),

    #[error("Route is not valid UTF-8")]
    InvalidRoute,

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Compression failed")]
    CompressionFailure,

    #[error("Decompression failed")]
    DecompressionFailure,

    /// A message was requested from a packet that does not carry one.
    #[error("Unexpected packet kind: {0}")]
    UnexpectedPacket(u8),

    #[error("Handshake error: {0}")]
    HandshakeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
