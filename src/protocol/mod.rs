//! # Message Layer
//!
//! Typed, routed application messages and the data that travels alongside them.
//!
//! ## Components
//! - **Message**: flags, varint id, literal or dictionary-coded route, body
//! - **Route**: shared route <-> code dictionary for route compression
//! - **Handshake**: JSON bodies of the Handshake packet exchange
//!
//! A message is wrapped in a Data [`Packet`](crate::core::packet::Packet) for
//! transmission; see [`MessageCodec::to_packet`](message::MessageCodec::to_packet).

pub mod handshake;
pub mod message;
pub mod route;

#[cfg(test)]
mod tests;
