#![no_main]

use libfuzzer_sys::fuzz_target;
use pomelo_protocol::utils::compression::{compress, decompress, CompressionKind};

fuzz_target!(|data: &[u8]| {
    for kind in [CompressionKind::Gzip, CompressionKind::Lz4, CompressionKind::Zstd] {
        // Roundtrip must be lossless
        if let Ok(compressed) = compress(data, &kind) {
            let restored = decompress(&compressed, &kind).expect("own output decompresses");
            assert_eq!(restored.as_slice(), data);
        }

        // Raw decompression of malformed data must respect size limits
        let _ = decompress(data, &kind);
    }
});
