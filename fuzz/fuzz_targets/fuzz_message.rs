#![no_main]

use libfuzzer_sys::fuzz_target;
use pomelo_protocol::{MessageCodec, RouteTable};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let routes = RouteTable::from_dict([("connector.entryHandler.entry", 1), ("onChat", 0x0102)])
        .expect("static dictionary");
    let codec = MessageCodec::new(Arc::new(routes));

    // Anything that decodes must survive a second trip unchanged
    if let Ok(msg) = codec.decode(data) {
        if let Ok(bytes) = codec.encode(&msg) {
            let again = codec.decode(&bytes).expect("re-encoded message decodes");
            assert_eq!(again.body, msg.body);
            assert_eq!(again.id, msg.id);
            assert_eq!(again.kind, msg.kind);
        }
    }
});
