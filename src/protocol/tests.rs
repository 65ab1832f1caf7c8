// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::core::packet::{Packet, PacketKind};
use crate::protocol::handshake::{HandshakeRequest, HandshakeResponse};
use crate::protocol::message::{Message, MessageCodec, MessageKind};
use crate::protocol::route::RouteTable;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_full_session_flow() {
    // =================== Step 1: Client hello ===================
    let hello = HandshakeRequest::new("rust", "0.1.0")
        .to_packet()
        .expect("Client request should encode");
    let wire = hello.to_bytes().expect("Handshake packet should frame");

    // =================== Step 2: Server answers with its dictionary ===================
    let received = Packet::from_bytes(&wire).expect("Server should parse frame");
    let request = HandshakeRequest::from_packet(&received).expect("Server should parse request");
    assert_eq!(request.sys.client_type, "rust");

    let server_routes = Arc::new(
        RouteTable::from_dict([("connector.entryHandler.entry", 1), ("onChat", 2)])
            .expect("Server dictionary"),
    );
    let reply = HandshakeResponse::accept(Duration::from_secs(10), &server_routes)
        .to_packet()
        .and_then(|p| p.to_bytes())
        .expect("Server reply should frame");

    // =================== Step 3: Client installs dictionary and acks ===================
    let client_routes = Arc::new(RouteTable::new());
    let response = HandshakeResponse::from_packet(&Packet::from_bytes(&reply).unwrap())
        .expect("Client should parse response");
    assert_eq!(response.heartbeat(), Some(Duration::from_secs(10)));
    response.install_dict(&client_routes).unwrap();
    assert_eq!(
        Packet::handshake_ack().to_bytes().unwrap(),
        vec![PacketKind::HandshakeAck.as_u8(), 0, 0, 0]
    );

    // =================== Step 4: Data flows with compressed routes ===================
    let client = MessageCodec::new(client_routes);
    let server = MessageCodec::new(server_routes);

    let request = Message::request(1, "connector.entryHandler.entry", b"{\"uid\":7}".to_vec())
        .with_route_compression(true);
    let frame = client.to_packet(&request).unwrap().to_bytes().unwrap();
    // 4-byte header, flags, 1-byte id, 2-byte code, body
    assert_eq!(frame.len(), 4 + 1 + 1 + 2 + 9);

    let at_server = server.from_packet(&Packet::from_bytes(&frame).unwrap()).unwrap();
    assert_eq!(at_server, request);

    let push = Message::push("onChat", b"{\"msg\":\"hi\"}".to_vec())
        .with_route_compression(true)
        .with_gzip(true);
    let frame = server.to_packet(&push).unwrap().to_bytes().unwrap();
    let at_client = client.from_packet(&Packet::from_bytes(&frame).unwrap()).unwrap();
    assert_eq!(at_client.kind, MessageKind::Push);
    assert_eq!(at_client.route, "onChat");
    assert_eq!(at_client.body, b"{\"msg\":\"hi\"}");
}

#[test]
fn test_mismatched_dictionaries_degrade_to_empty_route() {
    let sender = MessageCodec::new(Arc::new(RouteTable::from_dict([("area.move", 42)]).unwrap()));
    let receiver = MessageCodec::new(Arc::new(RouteTable::new()));

    let msg = Message::notify("area.move", b"{}".to_vec()).with_route_compression(true);
    let decoded = receiver.decode(&sender.encode(&msg).unwrap()).unwrap();

    assert_eq!(decoded.kind, MessageKind::Notify);
    assert!(decoded.route.is_empty());
    assert_eq!(decoded.body, b"{}");
}

#[test]
fn test_coalesced_frames_decode_in_order() {
    let codec = MessageCodec::new(Arc::new(RouteTable::new()));
    let mut wire = Vec::new();
    for id in 1..=3u64 {
        let msg = Message::response(id, format!("{{\"n\":{id}}}").into_bytes());
        wire.extend(codec.to_packet(&msg).unwrap().to_bytes().unwrap());
    }
    wire.extend(Packet::heartbeat().to_bytes().unwrap());

    let packets = Packet::decode_all(&wire).unwrap();
    assert_eq!(packets.len(), 4);
    let ids: Vec<u64> = packets[..3]
        .iter()
        .map(|p| codec.from_packet(p).unwrap().id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(packets[3].kind, PacketKind::Heartbeat);
}

#[test]
fn test_codec_clones_share_state() {
    let routes = Arc::new(RouteTable::new());
    let codec = MessageCodec::new(Arc::clone(&routes));
    let clone = codec.clone();

    routes.register([("late.route", 9)]).unwrap();
    let bytes = clone
        .encode(&Message::notify("late.route", Vec::new()).with_route_compression(true))
        .unwrap();
    assert_eq!(bytes, vec![0x03, 0x00, 0x09]);
    assert_eq!(codec.metrics().snapshot().messages_encoded, 1);
}
