//! builder/buffer.rs
//! Output builders bound to an in-process buffer.
//!
//! Each materialize writes into a fresh buffer owned by the returned
//! [`BufferOutput`]. The bytes only become reachable through
//! [`BufferOutput::close`], after every layer has been finalized.

use std::io::{self, BufRead, Read, Write};
use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::builder::options::{charset_options, output_options, OutputOptions};
use crate::builder::output::OutBuilder;
use crate::charset::Charset;
use crate::config::IoContext;
use crate::stream::{
    BoxedOutput, Closeable, DataWriter, ObjectWriter, OutputHandle, SharedBuffer, Sink, TextWriter, ZipOutput,
};
use crate::types::Result;

/// Sink writing into a [`SharedBuffer`], optionally named for codec lookup.
pub struct BufferSink {
    buffer: SharedBuffer,
    name: Option<String>,
}

impl BufferSink {
    pub fn new(buffer: SharedBuffer, name: Option<String>) -> Self {
        Self { buffer, name }
    }
}

impl Sink for BufferSink {
    fn open(&mut self) -> Result<BoxedOutput> {
        Ok(Box::new(self.buffer.writer()))
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Bytes accumulated by a closed [`BufferOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    charset: Charset,
}

impl OutputBuffer {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Decode with the builder's charset.
    pub fn to_text(&self) -> String {
        self.charset.decode(&self.bytes)
    }

    pub fn to_text_with(&self, charset: Charset) -> String {
        charset.decode(&self.bytes)
    }
}

/// Handle `T` plus the buffer its chain ends in.
pub struct BufferOutput<T> {
    handle: T,
    buffer: SharedBuffer,
    charset: Charset,
}

impl<T: Closeable> BufferOutput<T> {
    fn new(handle: T, buffer: SharedBuffer, charset: Charset) -> Self {
        Self { handle, buffer, charset }
    }

    /// Close the whole chain and hand out what reached the buffer.
    pub fn close(self) -> Result<OutputBuffer> {
        self.handle.close()?;
        Ok(OutputBuffer { bytes: self.buffer.take(), charset: self.charset })
    }
}

impl<T> Deref for BufferOutput<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.handle
    }
}

impl<T> DerefMut for BufferOutput<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.handle
    }
}

impl<T: Write> Write for BufferOutput<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.handle.flush()
    }
}

/// Buffer-backed output builder returning raw bytes.
#[derive(Clone)]
pub struct ByteOutBuilder {
    name: Option<String>,
    options: OutputOptions,
    context: IoContext,
}

impl Default for ByteOutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteOutBuilder {
    pub fn new() -> Self {
        Self::with_context(IoContext::default())
    }

    pub fn with_context(context: IoContext) -> Self {
        let options = OutputOptions::new(context.default_charset());
        Self { name: None, options, context }
    }

    /// Name the buffer so `compress()` can resolve a codec from it.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OutputOptions {
        &mut self.options
    }

    pub fn context(&self) -> &IoContext {
        &self.context
    }

    charset_options!();
    output_options!();

    /// Run `op` against an [`OutBuilder`] sharing these options over a fresh buffer.
    fn with_buffer<T>(&self, op: impl FnOnce(&mut OutBuilder<BufferSink>) -> Result<T>) -> Result<(T, SharedBuffer)> {
        let buffer = SharedBuffer::new();
        let sink = BufferSink::new(buffer.clone(), self.name.clone());
        let mut out = OutBuilder::from_parts(sink, self.options.clone(), self.context.clone());
        let value = op(&mut out)?;
        Ok((value, buffer))
    }

    fn materialize<T: Closeable>(
        &self,
        open: impl FnOnce(&mut OutBuilder<BufferSink>) -> Result<T>,
    ) -> Result<BufferOutput<T>> {
        let (handle, buffer) = self.with_buffer(open)?;
        Ok(BufferOutput::new(handle, buffer, self.options.charset))
    }

    fn collect(&self, op: impl FnOnce(&mut OutBuilder<BufferSink>) -> Result<()>) -> Result<Vec<u8>> {
        let ((), buffer) = self.with_buffer(op)?;
        Ok(buffer.take())
    }

    // ================= Materializers =================

    pub fn as_stream(&self) -> Result<BufferOutput<OutputHandle>> {
        self.materialize(|out| out.as_stream())
    }

    pub fn as_writer(&self) -> Result<BufferOutput<TextWriter>> {
        self.materialize(|out| out.as_writer())
    }

    pub fn as_objects(&self) -> Result<BufferOutput<ObjectWriter>> {
        self.materialize(|out| out.as_objects())
    }

    pub fn as_data(&self) -> Result<BufferOutput<DataWriter>> {
        self.materialize(|out| out.as_data())
    }

    pub fn as_zip(&self) -> Result<BufferOutput<ZipOutput>> {
        self.materialize(|out| out.as_zip())
    }

    // ================= One-shot writes =================

    pub fn write(&self, text: &str) -> Result<Vec<u8>> {
        self.collect(|out| out.write(text))
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        self.collect(|out| out.write_bytes(bytes))
    }

    pub fn write_lines<I, L>(&self, lines: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        self.collect(|out| out.write_lines(lines))
    }

    pub fn copy_from<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Vec<u8>> {
        self.collect(|out| out.copy_from(reader).map(|_| ()))
    }

    pub fn copy_text_from<R: BufRead + ?Sized>(&self, reader: &mut R) -> Result<Vec<u8>> {
        self.collect(|out| out.copy_text_from(reader).map(|_| ()))
    }

    pub fn write_object<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        self.collect(|out| out.write_object(value))
    }

    pub fn write_objects<T: Serialize>(&self, values: &[T]) -> Result<Vec<u8>> {
        self.collect(|out| out.write_objects(values))
    }

    pub fn write_with(&self, op: impl FnOnce(&mut OutputHandle) -> Result<()>) -> Result<Vec<u8>> {
        self.collect(|out| out.write_with(op))
    }

    pub fn write_text_with(&self, op: impl FnOnce(&mut TextWriter) -> Result<()>) -> Result<Vec<u8>> {
        self.collect(|out| out.write_text_with(op))
    }
}

/// Buffer-backed output builder returning text decoded with its charset.
#[derive(Clone, Default)]
pub struct StringOutBuilder {
    bytes: ByteOutBuilder,
}

impl StringOutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: IoContext) -> Self {
        Self { bytes: ByteOutBuilder::with_context(context) }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        Self { bytes: self.bytes.named(name) }
    }

    pub fn options(&self) -> &OutputOptions {
        self.bytes.options()
    }

    fn options_mut(&mut self) -> &mut OutputOptions {
        self.bytes.options_mut()
    }

    pub fn context(&self) -> &IoContext {
        self.bytes.context()
    }

    charset_options!();
    output_options!();

    fn decode(&self, bytes: Vec<u8>) -> String {
        self.charset().decode(&bytes)
    }

    pub fn as_stream(&self) -> Result<BufferOutput<OutputHandle>> {
        self.bytes.as_stream()
    }

    pub fn as_writer(&self) -> Result<BufferOutput<TextWriter>> {
        self.bytes.as_writer()
    }

    pub fn as_objects(&self) -> Result<BufferOutput<ObjectWriter>> {
        self.bytes.as_objects()
    }

    pub fn as_data(&self) -> Result<BufferOutput<DataWriter>> {
        self.bytes.as_data()
    }

    pub fn as_zip(&self) -> Result<BufferOutput<ZipOutput>> {
        self.bytes.as_zip()
    }

    pub fn write(&self, text: &str) -> Result<String> {
        Ok(self.decode(self.bytes.write(text)?))
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> Result<String> {
        Ok(self.decode(self.bytes.write_bytes(bytes)?))
    }

    pub fn write_lines<I, L>(&self, lines: I) -> Result<String>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        Ok(self.decode(self.bytes.write_lines(lines)?))
    }

    pub fn copy_from<R: Read + ?Sized>(&self, reader: &mut R) -> Result<String> {
        Ok(self.decode(self.bytes.copy_from(reader)?))
    }

    pub fn copy_text_from<R: BufRead + ?Sized>(&self, reader: &mut R) -> Result<String> {
        Ok(self.decode(self.bytes.copy_text_from(reader)?))
    }

    pub fn write_object<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(self.decode(self.bytes.write_object(value)?))
    }

    pub fn write_objects<T: Serialize>(&self, values: &[T]) -> Result<String> {
        Ok(self.decode(self.bytes.write_objects(values)?))
    }

    pub fn write_with(&self, op: impl FnOnce(&mut OutputHandle) -> Result<()>) -> Result<String> {
        Ok(self.decode(self.bytes.write_with(op)?))
    }

    pub fn write_text_with(&self, op: impl FnOnce(&mut TextWriter) -> Result<()>) -> Result<String> {
        Ok(self.decode(self.bytes.write_text_with(op)?))
    }
}
