//! charset/types.rs
//! Supported character sets and name resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::charset::codec::{Decoder, Encoder};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Charset {
    Utf8,
    /// UTF-16 with byte order mark; big-endian when no mark is present.
    Utf16,
    Utf16Be,
    Utf16Le,
    Ascii,
    Iso8859_1,
}

impl Charset {
    pub const ALL: [Charset; 6] = [
        Charset::Utf8,
        Charset::Utf16,
        Charset::Utf16Be,
        Charset::Utf16Le,
        Charset::Ascii,
        Charset::Iso8859_1,
    ];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16 => "UTF-16",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Ascii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Resolve a charset by canonical name or common alias, ignoring case.
    pub fn for_name(name: &str) -> Option<Charset> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "utf8" => Some(Charset::Utf8),
            "utf16" => Some(Charset::Utf16),
            "utf16be" => Some(Charset::Utf16Be),
            "utf16le" => Some(Charset::Utf16Le),
            "ascii" | "usascii" => Some(Charset::Ascii),
            "iso88591" | "latin1" | "l1" => Some(Charset::Iso8859_1),
            _ => None,
        }
    }

    /// Encode a complete string in one call.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        self.encoder().encode(text, &mut out);
        out
    }

    /// Decode a complete byte sequence in one call.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut decoder = self.decoder();
        decoder.decode(bytes, &mut out);
        decoder.finish(&mut out);
        out
    }

    pub fn encoder(&self) -> Encoder {
        Encoder::new(*self)
    }

    pub fn decoder(&self) -> Decoder {
        Decoder::new(*self)
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::Utf8
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCharset(pub String);

impl fmt::Display for UnknownCharset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown charset: {}", self.0)
    }
}

impl std::error::Error for UnknownCharset {}

impl FromStr for Charset {
    type Err = UnknownCharset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Charset::for_name(s).ok_or_else(|| UnknownCharset(s.to_string()))
    }
}

impl From<Charset> for String {
    fn from(c: Charset) -> Self {
        c.name().to_string()
    }
}

impl TryFrom<String> for Charset {
    type Error = UnknownCharset;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Resolve `name`, falling back to `default` when it is unknown.
pub fn resolve_charset_name(name: &str, default: Charset) -> Charset {
    match Charset::for_name(name) {
        Some(charset) => charset,
        None => {
            tracing::warn!(requested = name, fallback = %default, "unknown charset, using default");
            default
        }
    }
}
