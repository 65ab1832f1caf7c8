//! # Configuration Management
//!
//! Centralized configuration for the codec.
//!
//! The only externally supplied protocol data is the route dictionary; the rest
//! tunes body compression, frame limits and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Example
//! ```toml
//! [codec]
//! compression = "gzip"
//! compression_level = 6
//!
//! [routes]
//! dict_file = "config/dictionary.json"
//!
//! [routes.dict]
//! "connector.entryHandler.entry" = 1
//! "chat.chatHandler.send" = 2
//!
//! [logging]
//! log_level = "debug"
//! ```

use crate::core::codec::PacketCodec;
use crate::core::packet::MAX_PACKET_PAYLOAD;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::MessageCodec;
use crate::protocol::route::RouteTable;
use crate::utils::compression::{BodyCompressor, CompressionKind, MAX_DECOMPRESSION_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Codec configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Route dictionary
    #[serde(default)]
    pub routes: RouteConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN))
        })?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE))
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup("POMELO_PROTOCOL_COMPRESSION") {
            self.codec.compression = kind.parse()?;
        }

        if let Some(level) = lookup("POMELO_PROTOCOL_COMPRESSION_LEVEL") {
            if let Ok(val) = level.parse::<i32>() {
                self.codec.compression_level = val;
            }
        }

        if let Some(size) = lookup("POMELO_PROTOCOL_MAX_DECOMPRESSED_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                self.codec.max_decompressed_size = val;
            }
        }

        if let Some(size) = lookup("POMELO_PROTOCOL_MAX_PAYLOAD_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                self.codec.max_payload_size = val;
            }
        }

        if let Some(path) = lookup("POMELO_PROTOCOL_DICT_FILE") {
            self.routes.dict_file = Some(PathBuf::from(path));
        }

        if let Some(level) = lookup("POMELO_PROTOCOL_LOG_LEVEL") {
            self.logging.log_level = level
                .parse::<Level>()
                .map_err(|_| ProtocolError::ConfigError(format!("Invalid log level: {level}")))?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.routes.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }

    /// Build the route table from the inline dictionary, then the dictionary file.
    pub fn build_route_table(&self) -> Result<Arc<RouteTable>> {
        let table = RouteTable::new();
        let mut inserted = table.register(self.routes.dict.iter().map(|(r, c)| (r.as_str(), *c)))?;
        if let Some(path) = &self.routes.dict_file {
            let dict = load_dict_file(path)?;
            inserted += table.register(dict.iter().map(|(r, c)| (r.as_str(), *c)))?;
        }
        info!(routes = inserted, "Route table built from configuration");
        Ok(Arc::new(table))
    }

    /// Build a message codec with this configuration's routes and compression.
    pub fn build_codec(&self) -> Result<MessageCodec> {
        Ok(MessageCodec::with_compressor(
            self.build_route_table()?,
            self.codec.compressor(),
        ))
    }

    /// Stream codec honoring the configured payload limit.
    pub fn packet_codec(&self) -> PacketCodec {
        PacketCodec::with_max_payload_size(self.codec.max_payload_size)
    }
}

/// Read a JSON object of route -> code.
pub fn load_dict_file<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, u16>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ProtocolError::ConfigError(format!(
            "{} {}: {e}",
            constants::ERR_CONFIG_OPEN,
            path.display()
        ))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        ProtocolError::ConfigError(format!("{} {}: {e}", constants::ERR_DICT_PARSE, path.display()))
    })
}

/// Codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Algorithm used for bodies flagged as compressed
    pub compression: CompressionKind,

    /// Compression level for the chosen algorithm
    pub compression_level: i32,

    /// Largest body a compressed payload may inflate to
    pub max_decompressed_size: usize,

    /// Largest packet payload accepted from a stream
    pub max_payload_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression: CompressionKind::Gzip,
            compression_level: CompressionKind::Gzip.default_level(),
            max_decompressed_size: MAX_DECOMPRESSION_SIZE,
            max_payload_size: MAX_PACKET_PAYLOAD,
        }
    }
}

impl CodecConfig {
    pub fn compressor(&self) -> BodyCompressor {
        BodyCompressor::new(self.compression)
            .with_level(self.compression_level)
            .with_max_output(self.max_decompressed_size)
    }

    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let (lo, hi) = self.compression.level_range();
        if self.compression != CompressionKind::Lz4
            && (self.compression_level < lo || self.compression_level > hi)
        {
            errors.push(format!(
                "Invalid compression level: {} (valid range for {}: {lo}-{hi})",
                self.compression_level,
                self.compression.name()
            ));
        }

        if self.max_decompressed_size == 0 {
            errors.push("Max decompressed size cannot be 0".to_string());
        } else if self.max_decompressed_size > 256 * 1024 * 1024 {
            errors.push(format!(
                "Max decompressed size too large: {} bytes (maximum recommended: 256 MB)",
                self.max_decompressed_size
            ));
        }

        if self.max_payload_size == 0 {
            errors.push("Max payload size cannot be 0".to_string());
        } else if self.max_payload_size > MAX_PACKET_PAYLOAD {
            errors.push(format!(
                "Max payload size too large: {} bytes (length field allows {MAX_PACKET_PAYLOAD})",
                self.max_payload_size
            ));
        }

        errors
    }
}

/// Route dictionary configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfig {
    /// JSON file with more route -> code entries, registered after `dict`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dict_file: Option<PathBuf>,

    /// Inline dictionary, registered in route order
    pub dict: BTreeMap<String, u16>,
}

impl RouteConfig {
    /// Validate route configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen: HashMap<u16, &str> = HashMap::new();
        for (route, code) in &self.dict {
            if route.is_empty() {
                errors.push(format!("Route for code {code} cannot be empty"));
            }
            if let Some(first) = seen.insert(*code, route) {
                errors.push(format!(
                    "Route code {code} assigned to both '{first}' and '{route}'"
                ));
            }
        }

        if let Some(path) = &self.dict_file {
            if !path.exists() {
                errors.push(format!("Route dictionary file does not exist: {}", path.display()));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("pomelo-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
