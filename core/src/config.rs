//! config.rs
//! Pipeline configuration and the context every builder is created from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::charset::{resolve_charset_name, Charset};
use crate::compression::CodecRegistry;
use crate::constants::{env_keys, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::types::{Result, StreamError};

/// Configuration knobs carried into every builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Charset used when a builder does not pick one.
    /// - `None` at construction → UTF-8.
    pub default_charset: Charset,

    /// Capacity of the buffering layers and read chunks.
    /// - `None` at construction → 8 KiB; clamped to 1..=16 MiB.
    pub buffer_size: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            default_charset: Charset::Utf8,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

fn clamp_buffer_size(size: usize) -> usize {
    if size == 0 || size > MAX_BUFFER_SIZE {
        tracing::warn!(requested = size, fallback = DEFAULT_BUFFER_SIZE, "buffer size out of range");
        DEFAULT_BUFFER_SIZE
    } else {
        size
    }
}

impl IoConfig {
    pub fn new(default_charset: Option<Charset>, buffer_size: Option<usize>) -> Self {
        Self {
            default_charset: default_charset.unwrap_or_default(),
            buffer_size: buffer_size.map_or(DEFAULT_BUFFER_SIZE, clamp_buffer_size),
        }
    }

    /// Read `IOCHAIN_DEFAULT_CHARSET` and `IOCHAIN_BUFFER_SIZE`; unset or
    /// invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        let charset = std::env::var(env_keys::DEFAULT_CHARSET)
            .ok()
            .map(|name| resolve_charset_name(&name, Charset::Utf8));
        let buffer_size = std::env::var(env_keys::BUFFER_SIZE).ok().and_then(|raw| {
            raw.trim().parse::<usize>().map_err(|e| {
                tracing::warn!(value = %raw, error = %e, "ignoring {}", env_keys::BUFFER_SIZE);
            }).ok()
        });
        Self::new(charset, buffer_size)
    }

    /// Parse a JSON document; omitted fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: IoConfig = serde_json::from_str(json).map_err(|e| StreamError::Config(e.to_string()))?;
        Ok(Self::new(Some(parsed.default_charset), Some(parsed.buffer_size)))
    }

    pub fn with_default_charset(mut self, charset: Charset) -> Self {
        self.default_charset = charset;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = clamp_buffer_size(size);
        self
    }
}

/// Configuration plus the codec registry builders resolve names against.
#[derive(Debug, Clone)]
pub struct IoContext {
    config: IoConfig,
    registry: Arc<CodecRegistry>,
}

impl Default for IoContext {
    /// Default configuration bound to [`CodecRegistry::shared`].
    fn default() -> Self {
        Self::new(IoConfig::default(), CodecRegistry::shared())
    }
}

impl IoContext {
    pub fn new(config: IoConfig, registry: Arc<CodecRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn with_config(config: IoConfig) -> Self {
        Self::new(config, CodecRegistry::shared())
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    pub fn default_charset(&self) -> Charset {
        self.config.default_charset
    }

    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }
}
