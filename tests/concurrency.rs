#![allow(clippy::unwrap_used)]

use bytes::BytesMut;
use pomelo_protocol::core::codec::PacketCodec;
use pomelo_protocol::core::packet::Packet;
use pomelo_protocol::protocol::message::{Message, MessageCodec};
use pomelo_protocol::protocol::route::RouteTable;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::codec::{Decoder, Encoder};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_encode_decode_heavy() {
    let iterations = 5_000usize;
    let body_sizes = [0usize, 64, 512, 4096, 65536];
    let routes = Arc::new(RouteTable::from_dict([("area.move", 1), ("chat.send", 2)]).unwrap());
    let codec = MessageCodec::new(routes);

    let mut tasks = JoinSet::new();
    for &size in &body_sizes {
        let codec = codec.clone();
        tasks.spawn(async move {
            let mut packets = PacketCodec::new();
            let mut buf = BytesMut::new();
            for i in 0..iterations {
                let body = vec![((i + size) & 0xFF) as u8; size];
                let msg = Message::request(i as u64, "area.move", body)
                    .with_route_compression(true)
                    .with_gzip(i % 2 == 0);
                packets.encode(codec.to_packet(&msg).unwrap(), &mut buf).unwrap();
                let packet = packets.decode(&mut buf).unwrap().unwrap();
                assert_eq!(codec.from_packet(&packet).unwrap(), msg);
                assert!(buf.is_empty());
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let stats = codec.metrics().snapshot();
    let total = (iterations * body_sizes.len()) as u64;
    assert_eq!(stats.messages_encoded, total);
    assert_eq!(stats.messages_decoded, total);
    assert_eq!(stats.route_compression_hits, total);
    assert_eq!(stats.decode_errors, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registration_races_with_lookups() {
    let table = Arc::new(RouteTable::new());
    let codec = MessageCodec::new(table.clone());

    let mut tasks = JoinSet::new();
    for writer in 0..4u16 {
        let table = table.clone();
        tasks.spawn(async move {
            for i in 0..500u16 {
                let code = writer * 1000 + i;
                table.register([(format!("svc{writer}.handler{i}"), code)]).unwrap();
            }
        });
    }
    for _ in 0..4 {
        let codec = codec.clone();
        tasks.spawn(async move {
            for i in 0..2000u64 {
                let route = format!("svc{}.handler{}", i % 4, i % 500);
                let msg = Message::notify(route.clone(), Vec::new()).with_route_compression(true);
                let decoded = codec.decode(&codec.encode(&msg).unwrap()).unwrap();
                // Registered or not, the route survives the trip.
                assert_eq!(decoded.route, route);
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert_eq!(table.len(), 2000);
    assert_eq!(table.route_for(3499).as_deref(), Some("svc3.handler499"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn conflicting_registrations_keep_one_mapping() {
    let table = Arc::new(RouteTable::new());

    let mut tasks = JoinSet::new();
    for writer in 0..8u16 {
        let table = table.clone();
        tasks.spawn(async move { table.register([("contested.route", writer)]).unwrap() });
    }

    let mut inserted = 0;
    while let Some(res) = tasks.join_next().await {
        inserted += res.unwrap();
    }

    assert_eq!(inserted, 1);
    assert_eq!(table.len(), 1);
    let code = table.code_for("contested.route").unwrap();
    assert_eq!(table.route_for(code).as_deref(), Some("contested.route"));
}

#[test]
fn batch_decode_from_many_threads() {
    let mut wire = Vec::new();
    for i in 0..100u8 {
        wire.extend(Packet::data(vec![i; usize::from(i)]).to_bytes().unwrap());
    }
    let wire = Arc::new(wire);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let wire = wire.clone();
            std::thread::spawn(move || Packet::decode_all(&wire).unwrap().len())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 100);
    }
}
