//! Integration tests for the stream codec
//!
//! These tests drive `PacketCodec` both directly over `BytesMut` and through
//! `FramedRead`/`FramedWrite` over an in-memory duplex stream.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use pomelo_protocol::core::codec::PacketCodec;
use pomelo_protocol::core::packet::{Packet, PacketKind, HEADER_SIZE};
use pomelo_protocol::error::ProtocolError;
use pomelo_protocol::protocol::message::{Message, MessageCodec};
use pomelo_protocol::protocol::route::RouteTable;
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite};

#[test]
fn test_codec_decode_consumes_exactly_one_frame() {
    let mut codec = PacketCodec::new();

    let mut buffer = BytesMut::new();
    buffer.extend_from_slice(&Packet::data(vec![1, 2, 3, 4, 5]).to_bytes().unwrap());
    buffer.extend_from_slice(&Packet::heartbeat().to_bytes().unwrap());

    let first = codec.decode(&mut buffer).expect("Failed to decode").unwrap();
    assert_eq!(first.kind, PacketKind::Data);
    assert_eq!(first.payload, vec![1, 2, 3, 4, 5]);
    assert_eq!(buffer.len(), HEADER_SIZE);

    let second = codec.decode(&mut buffer).expect("Failed to decode").unwrap();
    assert_eq!(second.kind, PacketKind::Heartbeat);
    assert!(buffer.is_empty());
    assert!(codec.decode(&mut buffer).unwrap().is_none());
}

#[test]
fn test_codec_partial_header_preserves_buffer() {
    let mut codec = PacketCodec::new();
    let mut buffer = BytesMut::from(&[0x04, 0x00, 0x00][..]);

    let result = codec.decode(&mut buffer).expect("Decode should not error");
    assert!(result.is_none());
    assert_eq!(buffer.len(), 3);
}

#[test]
fn test_codec_byte_at_a_time() {
    let mut codec = PacketCodec::new();
    let bytes = Packet::data(b"{\"route\":\"chat\"}".to_vec()).to_bytes().unwrap();

    let mut buffer = BytesMut::new();
    let mut decoded = None;
    for (i, byte) in bytes.iter().enumerate() {
        buffer.extend_from_slice(&[*byte]);
        let result = codec.decode(&mut buffer).unwrap();
        if i + 1 < bytes.len() {
            assert!(result.is_none(), "frame complete too early at byte {i}");
        } else {
            decoded = result;
        }
    }
    assert_eq!(decoded.unwrap().payload, b"{\"route\":\"chat\"}");
}

#[test]
fn test_codec_encode_matches_to_bytes() {
    let mut codec = PacketCodec::new();
    let packet = Packet::data(vec![0u8; 100]);
    let expected = packet.to_bytes().unwrap();

    let mut buffer = BytesMut::new();
    codec.encode(packet, &mut buffer).expect("Failed to encode");
    assert_eq!(buffer.len(), HEADER_SIZE + 100);
    assert_eq!(&buffer[..], expected.as_slice());
}

#[test]
fn test_codec_rejects_oversized_header_before_payload() {
    let mut codec = PacketCodec::with_max_payload_size(1024);
    // Declares 2048 bytes; none of them are buffered yet.
    let mut buffer = BytesMut::from(&[0x04, 0x00, 0x08, 0x00][..]);
    assert!(matches!(
        codec.decode(&mut buffer),
        Err(ProtocolError::PayloadTooLarge(2048))
    ));

    let mut out = BytesMut::new();
    assert!(matches!(
        codec.encode(Packet::data(vec![0; 2048]), &mut out),
        Err(ProtocolError::PayloadTooLarge(2048))
    ));
    assert!(out.is_empty());
}

#[test]
fn test_codec_rejects_unknown_kind() {
    let mut codec = PacketCodec::new();
    let mut buffer = BytesMut::from(&[0x09, 0x00, 0x00, 0x00][..]);
    assert!(matches!(
        codec.decode(&mut buffer),
        Err(ProtocolError::InvalidPacketKind(9))
    ));
}

#[test]
fn test_max_payload_size_is_clamped() {
    let codec = PacketCodec::with_max_payload_size(usize::MAX);
    assert_eq!(codec.max_payload_size(), 0xFF_FFFF);
}

#[tokio::test]
async fn test_framed_session_over_duplex() {
    let (client, server) = tokio::io::duplex(64);
    let routes = Arc::new(RouteTable::from_dict([("chat.chatHandler.send", 7)]).unwrap());
    let codec = MessageCodec::new(routes);

    let outgoing = vec![
        Message::request(1, "chat.chatHandler.send", b"{\"content\":\"hello\"}".to_vec())
            .with_route_compression(true),
        Message::notify("area.playerHandler.move", b"{\"x\":10,\"y\":4}".to_vec()),
        Message::request(2, "chat.chatHandler.send", vec![b'z'; 2000]).with_gzip(true),
    ];

    let writer_codec = codec.clone();
    let expected = outgoing.clone();
    let writer = tokio::spawn(async move {
        let mut sink = FramedWrite::new(client, PacketCodec::new());
        sink.send(Packet::heartbeat()).await.unwrap();
        for msg in &outgoing {
            sink.send(writer_codec.to_packet(msg).unwrap()).await.unwrap();
        }
    });

    let mut stream = FramedRead::new(server, PacketCodec::new());
    let heartbeat = stream.next().await.unwrap().unwrap();
    assert_eq!(heartbeat.kind, PacketKind::Heartbeat);

    for msg in &expected {
        let packet = stream.next().await.unwrap().unwrap();
        assert_eq!(&codec.from_packet(&packet).unwrap(), msg);
    }

    writer.await.unwrap();
    assert!(stream.next().await.is_none());
}
