//! builder/input.rs
//! Input pipeline builder.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::builder::options::{charset_options, open_input_chain, text_reader, use_and_close, InputOptions};
use crate::charset::Charset;
use crate::config::IoContext;
use crate::constants::LINE_SEPARATOR;
use crate::stream::{
    BoxedInput, DataReader, InputSource, InputWrapper, LineStream, ObjectReader, Source, TextInputWrapper,
    TextReader, ZipInput,
};
use crate::types::{Result, StreamError};

/// Builds input handles over a [`Source`].
///
/// Raw wrappers always sit nearest the source, below decompression and
/// base64 decoding. Every materializing call reopens the source.
pub struct InBuilder<S: Source = InputSource> {
    source: S,
    options: InputOptions,
    context: IoContext,
}

impl InBuilder<InputSource> {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(InputSource::file(path))
    }

    /// Read from an already-open reader; single use.
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(InputSource::reader(reader))
    }

    pub fn bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(InputSource::memory(bytes))
    }

    /// Read `text` back as UTF-8.
    pub fn string(text: impl Into<Arc<str>>) -> Self {
        Self::new(InputSource::text(text)).with_charset(Charset::Utf8)
    }

    /// Read `text` encoded with `charset`.
    pub fn string_with(text: &str, charset: Charset) -> Self {
        Self::new(InputSource::memory(charset.encode(text))).with_charset(charset)
    }
}

impl<S: Source> InBuilder<S> {
    pub fn new(source: S) -> Self {
        Self::with_context(source, IoContext::default())
    }

    pub fn with_context(source: S, context: IoContext) -> Self {
        let options = InputOptions::new(context.default_charset());
        Self { source, options, context }
    }

    pub fn options(&self) -> &InputOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut InputOptions {
        &mut self.options
    }

    pub fn context(&self) -> &IoContext {
        &self.context
    }

    pub fn into_source(self) -> S {
        self.source
    }

    charset_options!();

    /// Decompress with the codec the source name resolves to, else inflate.
    pub fn decompress(mut self) -> Self {
        self.options.decompress = true;
        self
    }

    pub fn decompress_with(mut self, codec: InputWrapper) -> Self {
        self.options.decompress = true;
        self.options.codec = Some(codec);
        self
    }

    pub fn decode_base64(mut self) -> Self {
        self.options.base64 = true;
        self
    }

    pub fn decode_base64_with(mut self, engine: &'static base64::engine::GeneralPurpose) -> Self {
        self.options.base64 = true;
        self.options.base64_engine = engine;
        self
    }

    /// Append a byte-level decorator, applied nearest the source.
    pub fn wrap(mut self, wrapper: InputWrapper) -> Self {
        self.options.wrappers.push(wrapper);
        self
    }

    /// Append a character-level decorator, applied after the charset decoder.
    pub fn wrap_text(mut self, wrapper: TextInputWrapper) -> Self {
        self.options.text_wrappers.push(wrapper);
        self
    }

    // ================= Materializers =================

    /// Byte-level handle: source → raw wrappers → decompression → base64.
    pub fn as_stream(&mut self) -> Result<BoxedInput> {
        open_input_chain(&mut self.source, &self.options, &self.context)
    }

    pub fn as_reader(&mut self) -> Result<TextReader> {
        let stream = self.as_stream()?;
        text_reader(stream, &self.options, &self.context)
    }

    pub fn as_objects(&mut self) -> Result<ObjectReader> {
        let stream = self.as_stream()?;
        Ok(ObjectReader::new(stream, self.context.buffer_size()))
    }

    pub fn as_data(&mut self) -> Result<DataReader> {
        let stream = self.as_stream()?;
        Ok(DataReader::new(stream, self.context.buffer_size()))
    }

    pub fn as_zip(&mut self) -> Result<ZipInput> {
        Ok(ZipInput::new(self.as_stream()?, self.context.buffer_size()))
    }

    // ================= One-shot reads =================

    /// Lines joined by a single `\n`, without a trailing separator.
    pub fn read_all(&mut self) -> Result<String> {
        Ok(self.read_lines()?.join(LINE_SEPARATOR))
    }

    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        use_and_close(self.as_reader()?, |r| {
            let mut lines = Vec::new();
            while let Some(line) = r.read_line()? {
                lines.push(line);
            }
            Ok(lines)
        })
    }

    /// Lazy lines; the reader is released once the stream ends or is dropped.
    pub fn stream_lines(&mut self) -> Result<LineStream> {
        Ok(self.as_reader()?.lines())
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.as_stream()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    pub fn read_object<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.as_objects()?.read_object()
    }

    /// Read a sequence written by `OutBuilder::write_objects`.
    pub fn read_objects<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        self.as_objects()?.read_objects()
    }

    /// Copy everything into `writer` without closing it.
    pub fn copy_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64> {
        let mut stream = self.as_stream()?;
        Ok(io::copy(&mut stream, writer)?)
    }

    /// Copy decoded text into `writer` without closing it.
    /// Returns the number of UTF-8 bytes copied.
    pub fn copy_text_to<W: fmt::Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64> {
        use_and_close(self.as_reader()?, |r| {
            let mut total = 0u64;
            let mut chunk = String::new();
            loop {
                chunk.clear();
                let n = r.read_chunk(&mut chunk)?;
                if n == 0 {
                    return Ok(total);
                }
                writer.write_str(&chunk).map_err(|_| {
                    StreamError::Io(io::Error::new(io::ErrorKind::Other, "text destination rejected write"))
                })?;
                total += n as u64;
            }
        })
    }
}
