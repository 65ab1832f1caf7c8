//! Message body compression.
//!
//! Gzip is the format the flags byte advertises and what every peer expects.
//! Zstd and LZ4 are available for deployments that control both ends; any kind
//! works as long as both sides use the same one.

use crate::error::{ProtocolError, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    #[default]
    Gzip,
    Zstd,
    Lz4,
}

impl CompressionKind {
    /// Default level for this algorithm
    #[must_use]
    pub fn default_level(self) -> i32 {
        match self {
            CompressionKind::Gzip => 6,
            CompressionKind::Zstd => 1,
            CompressionKind::Lz4 => 0,
        }
    }

    /// Valid level range for this algorithm
    #[must_use]
    pub fn level_range(self) -> (i32, i32) {
        match self {
            CompressionKind::Gzip => (0, 9),
            CompressionKind::Zstd => (1, 22),
            CompressionKind::Lz4 => (0, 0),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CompressionKind::Gzip => "gzip",
            CompressionKind::Zstd => "zstd",
            CompressionKind::Lz4 => "lz4",
        }
    }
}

impl std::str::FromStr for CompressionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" => Ok(CompressionKind::Gzip),
            "zstd" => Ok(CompressionKind::Zstd),
            "lz4" => Ok(CompressionKind::Lz4),
            other => Err(ProtocolError::ConfigError(format!(
                "Unknown compression kind: {other}"
            ))),
        }
    }
}

/// Maximum output size for decompression (16 MB)
pub const MAX_DECOMPRESSION_SIZE: usize = 16 * 1024 * 1024;

/// Body compressor with a fixed algorithm, level and output limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyCompressor {
    kind: CompressionKind,
    level: i32,
    max_output: usize,
}

impl Default for BodyCompressor {
    fn default() -> Self {
        Self::new(CompressionKind::Gzip)
    }
}

impl BodyCompressor {
    #[must_use]
    pub fn new(kind: CompressionKind) -> Self {
        Self {
            kind,
            level: kind.default_level(),
            max_output: MAX_DECOMPRESSION_SIZE,
        }
    }

    /// Set the level, clamped to the algorithm's valid range
    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        let (lo, hi) = self.kind.level_range();
        self.level = level.clamp(lo, hi);
        self
    }

    #[must_use]
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    #[must_use]
    pub fn kind(&self) -> CompressionKind {
        self.kind
    }

    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Compresses data
    ///
    /// # Errors
    /// Returns `ProtocolError::CompressionFailure` if compression fails
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.kind {
            CompressionKind::Gzip => {
                // level is clamped to 0..=9 by with_level
                let level = Compression::new(self.level.max(0) as u32);
                let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), level);
                encoder
                    .write_all(data)
                    .map_err(|_| ProtocolError::CompressionFailure)?;
                encoder.finish().map_err(|_| ProtocolError::CompressionFailure)
            }
            CompressionKind::Zstd => {
                let mut out = Vec::new();
                zstd::stream::copy_encode(data, &mut out, self.level)
                    .map_err(|_| ProtocolError::CompressionFailure)?;
                Ok(out)
            }
            CompressionKind::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        }
    }

    /// Decompresses data, enforcing the output limit to stop decompression bombs
    ///
    /// # Errors
    /// Returns `ProtocolError::DecompressionFailure` if:
    /// - the input is corrupt or truncated
    /// - the output would exceed the configured limit
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.kind {
            // Concatenated members form one body; bytes after a member must start another.
            CompressionKind::Gzip => read_limited(MultiGzDecoder::new(data), self.max_output),
            CompressionKind::Zstd => {
                let decoder = zstd::stream::Decoder::new(data)
                    .map_err(|_| ProtocolError::DecompressionFailure)?;
                read_limited(decoder, self.max_output)
            }
            CompressionKind::Lz4 => {
                // lz4_flex prepends the uncompressed size as 4 little-endian bytes;
                // check it before lz4_flex allocates.
                if data.len() < 4 {
                    return Err(ProtocolError::DecompressionFailure);
                }
                let claimed = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
                if claimed > self.max_output {
                    return Err(ProtocolError::DecompressionFailure);
                }
                lz4_flex::decompress_size_prepended(data)
                    .map_err(|_| ProtocolError::DecompressionFailure)
            }
        }
    }
}

/// Drain `reader`, failing once more than `limit` bytes come out.
fn read_limited<R: Read>(reader: R, limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    reader
        .take(cap)
        .read_to_end(&mut out)
        .map_err(|_| ProtocolError::DecompressionFailure)?;
    if out.len() > limit {
        return Err(ProtocolError::DecompressionFailure);
    }
    Ok(out)
}

/// Compresses data with the default settings for `kind`
pub fn compress(data: &[u8], kind: &CompressionKind) -> Result<Vec<u8>> {
    BodyCompressor::new(*kind).compress(data)
}

/// Decompresses data with the default settings for `kind`
pub fn decompress(data: &[u8], kind: &CompressionKind) -> Result<Vec<u8>> {
    BodyCompressor::new(*kind).decompress(data)
}
