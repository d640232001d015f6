//! compression/types.rs
//! Built-in codec identifiers and their wrapper factories.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use crate::compression::codecs::{deflate, gzip, lz4, zip, zstd};
use crate::compression::constants::extensions;
use crate::stream::{BoxedInput, BoxedOutput, InputWrapper, OutputWrapper};
use crate::types::StreamError;

/// Codecs shipped with the crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    Gzip,
    /// zlib-wrapped deflate; the fallback when no codec can be inferred.
    Deflate,
    /// Single-entry zip archive.
    Zip,
    Zstd,
    Lz4,
}

impl CompressionCodec {
    pub const ALL: [CompressionCodec; 5] = [
        CompressionCodec::Gzip,
        CompressionCodec::Deflate,
        CompressionCodec::Zip,
        CompressionCodec::Zstd,
        CompressionCodec::Lz4,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CompressionCodec::Gzip => "gzip",
            CompressionCodec::Deflate => "deflate",
            CompressionCodec::Zip => "zip",
            CompressionCodec::Zstd => "zstd",
            CompressionCodec::Lz4 => "lz4",
        }
    }

    /// File extension this codec is registered under, if any.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            CompressionCodec::Gzip => Some(extensions::GZIP),
            CompressionCodec::Zip => Some(extensions::ZIP),
            CompressionCodec::Zstd => Some(extensions::ZSTD),
            CompressionCodec::Lz4 => Some(extensions::LZ4),
            CompressionCodec::Deflate => None,
        }
    }

    pub fn wrap_input(&self, input: BoxedInput) -> io::Result<BoxedInput> {
        match self {
            CompressionCodec::Gzip => gzip::decode(input),
            CompressionCodec::Deflate => deflate::decode(input),
            CompressionCodec::Zip => zip::decode(input),
            CompressionCodec::Zstd => zstd::decode(input),
            CompressionCodec::Lz4 => lz4::decode(input),
        }
    }

    pub fn wrap_output(&self, output: BoxedOutput) -> io::Result<BoxedOutput> {
        match self {
            CompressionCodec::Gzip => gzip::encode(output),
            CompressionCodec::Deflate => deflate::encode(output),
            CompressionCodec::Zip => zip::encode(output),
            CompressionCodec::Zstd => zstd::encode(output),
            CompressionCodec::Lz4 => lz4::encode(output),
        }
    }

    /// Decode wrapper suitable for the registry or `InBuilder::decompress_with`.
    pub fn decoder(self) -> InputWrapper {
        Arc::new(move |input| self.wrap_input(input))
    }

    /// Encode wrapper suitable for the registry or `OutBuilder::compress_with`.
    pub fn encoder(self) -> OutputWrapper {
        Arc::new(move |output| self.wrap_output(output))
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionCodec {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        CompressionCodec::ALL
            .into_iter()
            .find(|c| c.name() == lower || c.extension() == Some(lower.as_str()))
            .ok_or_else(|| StreamError::codec(s, "unknown compression codec"))
    }
}
