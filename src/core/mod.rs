//! # Core Protocol Components
//!
//! Low-level framing, varints and bounds-checked reads.
//!
//! This module provides the foundation for the protocol: the packet frame, the
//! tokio codec that carries packets over byte streams, and the varint encoding
//! used for message ids.
//!
//! ## Components
//! - **Packet**: 4-byte header (kind + 24-bit length) and opaque payload
//! - **Codec**: Tokio codec for framing over byte streams
//! - **Varint**: 7-bit continuation encoding for unsigned integers
//! - **Reader**: bounds-checked cursor shared by every decoder
//!
//! ## Wire Format
//! ```text
//! [Kind(1)] [Length(3)] [Payload(N)]
//! ```
//!
//! ## Safety
//! - Maximum payload size: 16MB - 1 (limit of the 24-bit length)
//! - Length validation before allocation
//! - Short buffers are reported as errors, never read past

pub mod codec;
pub mod packet;
pub mod reader;
pub mod varint;
