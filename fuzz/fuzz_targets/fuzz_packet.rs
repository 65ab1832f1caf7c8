#![no_main]

use libfuzzer_sys::fuzz_target;
use pomelo_protocol::Packet;

fuzz_target!(|data: &[u8]| {
    // Single-frame and batch decoding must never panic
    if let Ok(packet) = Packet::from_bytes(data) {
        let bytes = packet.to_bytes().expect("decoded packet re-encodes");
        assert_eq!(bytes.as_slice(), &data[..bytes.len()]);
    }
    let _ = Packet::decode_all(data);
});
