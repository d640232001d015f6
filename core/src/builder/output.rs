//! builder/output.rs
//! Output pipeline builder.

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::builder::options::{
    charset_options, open_output_chain, output_options, text_writer, use_and_close, OutputOptions,
};
use crate::config::IoContext;
use crate::stream::layers::buffered;
use crate::stream::{DataWriter, ObjectWriter, OutputHandle, OutputSink, Sink, TextWriter, ZipOutput};
use crate::types::Result;

/// Builds output handles over a [`Sink`].
///
/// Every materializing call (`as_stream`, `as_writer`, ...) opens the sink
/// again and rebuilds the whole chain. A single-use sink can therefore be
/// materialized once; the second attempt fails with `SinkConsumed`.
pub struct OutBuilder<S: Sink = OutputSink> {
    sink: S,
    options: OutputOptions,
    context: IoContext,
}

impl OutBuilder<OutputSink> {
    /// Create (or truncate) `path`. The file name drives codec lookup.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(OutputSink::file(path))
    }

    /// Write into a caller-provided writer; single use.
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::new(OutputSink::writer(writer))
    }
}

impl<S: Sink> OutBuilder<S> {
    pub fn new(sink: S) -> Self {
        Self::with_context(sink, IoContext::default())
    }

    pub fn with_context(sink: S, context: IoContext) -> Self {
        let options = OutputOptions::new(context.default_charset());
        Self { sink, options, context }
    }

    pub(crate) fn from_parts(sink: S, options: OutputOptions, context: IoContext) -> Self {
        Self { sink, options, context }
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

    pub fn into_sink(self) -> S {
        self.sink
    }

    charset_options!();
    output_options!();

    // ================= Materializers =================

    /// Byte-level handle: sink → base64 → compression → raw wrappers.
    pub fn as_stream(&mut self) -> Result<OutputHandle> {
        let chain = open_output_chain(&mut self.sink, &self.options, &self.context)?;
        Ok(OutputHandle::new(chain))
    }

    /// Character handle on top of [`as_stream`](Self::as_stream).
    pub fn as_writer(&mut self) -> Result<TextWriter> {
        let stream = open_output_chain(&mut self.sink, &self.options, &self.context)?;
        text_writer(stream, &self.options, &self.context)
    }

    pub fn as_objects(&mut self) -> Result<ObjectWriter> {
        let stream = open_output_chain(&mut self.sink, &self.options, &self.context)?;
        Ok(ObjectWriter::new(buffered(stream, self.context.buffer_size())))
    }

    pub fn as_data(&mut self) -> Result<DataWriter> {
        let stream = open_output_chain(&mut self.sink, &self.options, &self.context)?;
        Ok(DataWriter::new(buffered(stream, self.context.buffer_size())))
    }

    pub fn as_zip(&mut self) -> Result<ZipOutput> {
        let stream = open_output_chain(&mut self.sink, &self.options, &self.context)?;
        Ok(ZipOutput::new(stream))
    }

    // ================= One-shot writes =================

    pub fn write(&mut self, text: &str) -> Result<()> {
        use_and_close(self.as_writer()?, |w| Ok(w.write_str(text)?))
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        use_and_close(self.as_stream()?, |s| Ok(s.write_all(bytes)?))
    }

    /// Each line is followed by the line separator.
    pub fn write_lines<I, L>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        use_and_close(self.as_writer()?, |w| {
            for line in lines {
                w.write_line(line.as_ref())?;
            }
            Ok(())
        })
    }

    /// Copy `reader` to the end; `reader` itself is left open.
    pub fn copy_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<u64> {
        use_and_close(self.as_stream()?, |s| Ok(io::copy(reader, s)?))
    }

    /// Copy UTF-8 text from `reader`, re-encoded with the builder's charset.
    /// Returns the number of bytes read.
    pub fn copy_text_from<R: BufRead + ?Sized>(&mut self, reader: &mut R) -> Result<u64> {
        use_and_close(self.as_writer()?, |w| {
            let mut total = 0u64;
            let mut line = String::new();
            loop {
                line.clear();
                let n = reader.read_line(&mut line)?;
                if n == 0 {
                    return Ok(total);
                }
                w.write_str(&line)?;
                total += n as u64;
            }
        })
    }

    pub fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        use_and_close(self.as_objects()?, |w| w.write_object(value))
    }

    /// Length-prefixed sequence, readable with `InBuilder::read_objects`.
    pub fn write_objects<T: Serialize>(&mut self, values: &[T]) -> Result<()> {
        use_and_close(self.as_objects()?, |w| w.write_objects(values))
    }

    /// Hand the byte-level handle to `op`; closed afterwards on every path.
    pub fn write_with<T>(&mut self, op: impl FnOnce(&mut OutputHandle) -> Result<T>) -> Result<T> {
        use_and_close(self.as_stream()?, op)
    }

    /// Hand the character handle to `op`; closed afterwards on every path.
    pub fn write_text_with<T>(&mut self, op: impl FnOnce(&mut TextWriter) -> Result<T>) -> Result<T> {
        use_and_close(self.as_writer()?, op)
    }
}
