//! # Utility Modules
//!
//! Supporting utilities for compression, logging, and metrics.
//!
//! ## Components
//! - **Compression**: gzip (wire default), Zstd and LZ4 body compression with size limits
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe codec counters
//!
//! ## Safety
//! - Decompression bomb protection (16MB default limit)

pub mod compression;
pub mod logging;
pub mod metrics;
