//! compression/registry.rs
//! Extension → codec registry and chained resolution.
//!
//! Notes:
//! - Decode and encode wrappers live in independent maps, so one direction can
//!   be registered without the other.
//! - Compound names resolve trailing extension first: `a.tar.gz` is decoded as
//!   `tar(gunzip(raw))` and encoded as `caller → tar → gzip → sink`.
//! - Registration is visible to every later resolution.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use once_cell::sync::Lazy;

use crate::compression::types::CompressionCodec;
use crate::stream::{BoxedInput, BoxedOutput, InputWrapper, OutputWrapper};

static SHARED: Lazy<Arc<CodecRegistry>> = Lazy::new(|| Arc::new(CodecRegistry::new()));

#[derive(Default)]
struct Tables {
    decoders: HashMap<String, InputWrapper>,
    encoders: HashMap<String, OutputWrapper>,
}

pub struct CodecRegistry {
    tables: RwLock<Tables>,
}

/// Final extension of `name`, i.e. the text after the last '.'.
fn trailing_extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|dot| &name[dot + 1..])
}

impl CodecRegistry {
    /// Registry with the built-in `gz` and `zip` entries.
    pub fn new() -> Self {
        let registry = Self::empty();
        for codec in [CompressionCodec::Gzip, CompressionCodec::Zip] {
            registry.register_codec(codec);
        }
        registry
    }

    /// Registry with no entries at all.
    pub fn empty() -> Self {
        Self { tables: RwLock::new(Tables::default()) }
    }

    /// Built-ins plus `zst` and `lz4`.
    pub fn with_extended_codecs() -> Self {
        let registry = Self::new();
        for codec in [CompressionCodec::Zstd, CompressionCodec::Lz4] {
            registry.register_codec(codec);
        }
        registry
    }

    /// Process-wide default instance, created on first use.
    pub fn shared() -> Arc<CodecRegistry> {
        Arc::clone(&SHARED)
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn register_codec(&self, codec: CompressionCodec) {
        if let Some(ext) = codec.extension() {
            self.register(ext, codec.decoder(), codec.encoder());
        }
    }

    /// True iff the final extension of `name` has a decode wrapper.
    pub fn can_decode(&self, name: &str) -> bool {
        trailing_extension(name).is_some_and(|ext| self.read().decoders.contains_key(ext))
    }

    /// True iff the final extension of `name` has an encode wrapper.
    pub fn can_encode(&self, name: &str) -> bool {
        trailing_extension(name).is_some_and(|ext| self.read().encoders.contains_key(ext))
    }

    /// Apply every decode wrapper matched by `name`, trailing extension first.
    pub fn wrap_for_decode(&self, name: &str, mut input: BoxedInput) -> io::Result<BoxedInput> {
        for (ext, wrapper) in self.resolve(name, |t, ext| t.decoders.get(ext).cloned()) {
            tracing::trace!(name, extension = ext, "decode codec matched");
            input = wrapper(input)?;
        }
        Ok(input)
    }

    /// Apply every encode wrapper matched by `name`, trailing extension first.
    pub fn wrap_for_encode(&self, name: &str, mut output: BoxedOutput) -> io::Result<BoxedOutput> {
        for (ext, wrapper) in self.resolve(name, |t, ext| t.encoders.get(ext).cloned()) {
            tracing::trace!(name, extension = ext, "encode codec matched");
            output = wrapper(output)?;
        }
        Ok(output)
    }

    /// Collect matching wrappers under a single read lock, so wrappers run
    /// without holding it.
    fn resolve<'n, W>(
        &self,
        name: &'n str,
        lookup: impl Fn(&Tables, &str) -> Option<W>,
    ) -> Vec<(&'n str, W)> {
        let tables = self.read();
        let mut matched = Vec::new();
        let mut rest = name;
        while let Some(dot) = rest.rfind('.') {
            let ext = &rest[dot + 1..];
            match lookup(&tables, ext) {
                Some(wrapper) => matched.push((ext, wrapper)),
                None => break,
            }
            // Strictly shorter on every pass.
            rest = &rest[..dot];
        }
        matched
    }

    /// Insert or overwrite both wrappers for `extension`.
    /// Returns whether either slot was previously empty.
    pub fn register(&self, extension: &str, decode: InputWrapper, encode: OutputWrapper) -> bool {
        let mut tables = self.write();
        let had_decoder = tables.decoders.insert(extension.to_string(), decode).is_some();
        let had_encoder = tables.encoders.insert(extension.to_string(), encode).is_some();
        tracing::debug!(extension, replaced = had_decoder && had_encoder, "codec registered");
        !(had_decoder && had_encoder)
    }

    /// Set only the decode wrapper, returning the one it replaced.
    pub fn register_decoder(&self, extension: &str, decode: InputWrapper) -> Option<InputWrapper> {
        tracing::debug!(extension, "decoder registered");
        self.write().decoders.insert(extension.to_string(), decode)
    }

    /// Set only the encode wrapper, returning the one it replaced.
    pub fn register_encoder(&self, extension: &str, encode: OutputWrapper) -> Option<OutputWrapper> {
        tracing::debug!(extension, "encoder registered");
        self.write().encoders.insert(extension.to_string(), encode)
    }

    /// Every extension with at least one wrapper, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let tables = self.read();
        let mut all: Vec<String> = tables
            .decoders
            .keys()
            .chain(tables.encoders.keys())
            .cloned()
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry").field("extensions", &self.extensions()).finish()
    }
}
