//! Observability and Metrics
//!
//! Counters for codec traffic, compression and route dictionary usage.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for codec operations
#[derive(Debug)]
pub struct Metrics {
    /// Messages encoded
    pub messages_encoded: AtomicU64,
    /// Messages decoded
    pub messages_decoded: AtomicU64,
    /// Bytes produced by message encoding
    pub bytes_encoded: AtomicU64,
    /// Bytes consumed by message decoding
    pub bytes_decoded: AtomicU64,
    /// Bodies compressed
    pub compressions: AtomicU64,
    /// Bodies decompressed
    pub decompressions: AtomicU64,
    /// Routes sent as a dictionary code
    pub route_compression_hits: AtomicU64,
    /// Routes requested compressed but sent literally
    pub route_compression_fallbacks: AtomicU64,
    /// Route codes received that the dictionary did not know
    pub unknown_route_codes: AtomicU64,
    /// Encode failures
    pub encode_errors: AtomicU64,
    /// Decode failures
    pub decode_errors: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            messages_encoded: AtomicU64::new(0),
            messages_decoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            compressions: AtomicU64::new(0),
            decompressions: AtomicU64::new(0),
            route_compression_hits: AtomicU64::new(0),
            route_compression_fallbacks: AtomicU64::new(0),
            unknown_route_codes: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn message_encoded(&self, byte_count: u64) {
        self.messages_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn message_decoded(&self, byte_count: u64) {
        self.messages_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn compression(&self) {
        self.compressions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decompression(&self) {
        self.decompressions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn route_compressed(&self) {
        self.route_compression_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn route_fallback(&self) {
        self.route_compression_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unknown_route_code(&self) {
        self.unknown_route_codes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_encoded: self.messages_encoded.load(Ordering::Relaxed),
            messages_decoded: self.messages_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            compressions: self.compressions.load(Ordering::Relaxed),
            decompressions: self.decompressions.load(Ordering::Relaxed),
            route_compression_hits: self.route_compression_hits.load(Ordering::Relaxed),
            route_compression_fallbacks: self.route_compression_fallbacks.load(Ordering::Relaxed),
            unknown_route_codes: self.unknown_route_codes.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            uptime_secs: self.uptime_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let s = self.snapshot();
        info!(
            messages_encoded = s.messages_encoded,
            messages_decoded = s.messages_decoded,
            bytes_encoded = s.bytes_encoded,
            bytes_decoded = s.bytes_decoded,
            compressions = s.compressions,
            decompressions = s.decompressions,
            route_hit_rate = s.route_compression_rate(),
            unknown_route_codes = s.unknown_route_codes,
            encode_errors = s.encode_errors,
            decode_errors = s.decode_errors,
            uptime_secs = s.uptime_secs,
            "Codec metrics"
        );
    }

    /// Reset all counters (useful for testing)
    pub fn reset(&self) {
        self.messages_encoded.store(0, Ordering::Relaxed);
        self.messages_decoded.store(0, Ordering::Relaxed);
        self.bytes_encoded.store(0, Ordering::Relaxed);
        self.bytes_decoded.store(0, Ordering::Relaxed);
        self.compressions.store(0, Ordering::Relaxed);
        self.decompressions.store(0, Ordering::Relaxed);
        self.route_compression_hits.store(0, Ordering::Relaxed);
        self.route_compression_fallbacks.store(0, Ordering::Relaxed);
        self.unknown_route_codes.store(0, Ordering::Relaxed);
        self.encode_errors.store(0, Ordering::Relaxed);
        self.decode_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_encoded: u64,
    pub messages_decoded: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub compressions: u64,
    pub decompressions: u64,
    pub route_compression_hits: u64,
    pub route_compression_fallbacks: u64,
    pub unknown_route_codes: u64,
    pub encode_errors: u64,
    pub decode_errors: u64,
    pub uptime_secs: u64,
}

impl MetricsSnapshot {
    /// Share of compressed-route requests that were served from the dictionary
    pub fn route_compression_rate(&self) -> f64 {
        let total = self.route_compression_hits + self.route_compression_fallbacks;
        if total == 0 {
            0.0
        } else {
            self.route_compression_hits as f64 / total as f64
        }
    }
}
