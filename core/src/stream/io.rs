// ## Leaf resources, chain links and the byte-level handle

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::stream::Closeable;
use crate::types::{Result, StreamError};

/// Readable end of a chain. Dropping it releases every layer.
pub type BoxedInput = Box<dyn Read + Send>;

/// Writable end of a chain.
pub type BoxedOutput = Box<dyn OutputStream>;

/// Decorator factory for the read side.
pub type InputWrapper = Arc<dyn Fn(BoxedInput) -> io::Result<BoxedInput> + Send + Sync>;

/// Decorator factory for the write side.
pub type OutputWrapper = Arc<dyn Fn(BoxedOutput) -> io::Result<BoxedOutput> + Send + Sync>;

/// One layer of an output chain.
///
/// `close` must finalize this layer (flush trailers, checksums, padding) into
/// the layer beneath and then close that layer, even when finalizing failed.
/// [`close_cascade`] implements the second half.
pub trait OutputStream: Write + Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Close `inner` after the current layer finished with `own`, keeping the first error.
pub fn close_cascade(own: io::Result<()>, inner: Option<BoxedOutput>) -> io::Result<()> {
    let below = match inner {
        Some(inner) => inner.close(),
        None => Ok(()),
    };
    match (own, below) {
        (Err(e), Err(lost)) => {
            tracing::warn!(error = %lost, "inner layer failed to close after outer failure");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), below) => below,
    }
}

// ================= Link =================

/// Write end that decorators hold instead of the next layer itself, so the
/// next layer can be detached and closed after the decorator finalizes.
pub struct Link {
    inner: Option<BoxedOutput>,
}

impl Link {
    pub fn new(inner: BoxedOutput) -> Self {
        Self { inner: Some(inner) }
    }

    /// Take the next layer out; later writes through this link fail.
    pub fn detach(&mut self) -> Option<BoxedOutput> {
        self.inner.take()
    }
}

fn detached() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "output layer already closed")
}

impl Write for Link {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(inner) => inner.write(buf),
            None => Err(detached()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

// ================= Leaf outputs =================

/// Terminal layer around any `Write`; closing flushes and drops it.
pub struct PlainOutput<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> PlainOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write + Send> Write for PlainOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> OutputStream for PlainOutput<W> {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Growable in-process buffer shared between a leaf writer and its owner.
#[derive(Clone, Default, Debug)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Move the accumulated bytes out, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }

    pub fn writer(&self) -> SharedBufferWriter {
        SharedBufferWriter { buf: self.clone() }
    }
}

pub struct SharedBufferWriter {
    buf: SharedBuffer,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputStream for SharedBufferWriter {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

// ================= Source / Sink =================

/// Something that can open a byte-input handle.
pub trait Source {
    fn open(&mut self) -> Result<BoxedInput>;

    /// Name used for extension-based codec lookup.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Something that can open a byte-output handle.
pub trait Sink {
    fn open(&mut self) -> Result<BoxedOutput>;

    /// Name used for extension-based codec lookup.
    fn name(&self) -> Option<&str> {
        None
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Canonical input abstraction
pub enum InputSource {
    /// Already-open reader; single use.
    Reader(Option<BoxedInput>),
    File(PathBuf),
    Memory(Arc<[u8]>),
    /// UTF-8 bytes of the held string.
    Text(Arc<str>),
}

impl InputSource {
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        InputSource::Reader(Some(Box::new(reader)))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        InputSource::File(path.into())
    }

    pub fn memory(bytes: impl Into<Arc<[u8]>>) -> Self {
        InputSource::Memory(bytes.into())
    }

    pub fn text(text: impl Into<Arc<str>>) -> Self {
        InputSource::Text(text.into())
    }
}

impl Source for InputSource {
    fn open(&mut self) -> Result<BoxedInput> {
        let reader: BoxedInput = match self {
            InputSource::Reader(slot) => slot
                .take()
                .ok_or_else(|| StreamError::SourceConsumed("reader".into()))?,
            InputSource::File(path) => Box::new(File::open(&*path)?),
            InputSource::Memory(bytes) => Box::new(Cursor::new(Arc::clone(bytes))),
            InputSource::Text(text) => Box::new(Cursor::new(TextBytes(Arc::clone(text)))),
        };
        Ok(reader)
    }

    fn name(&self) -> Option<&str> {
        match self {
            InputSource::File(path) => file_name(path),
            _ => None,
        }
    }
}

struct TextBytes(Arc<str>);

impl AsRef<[u8]> for TextBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Canonical output abstraction
pub enum OutputSink {
    /// Caller-provided writer; single use.
    Writer(Option<Box<dyn Write + Send>>),
    /// Created (or truncated) on every open.
    File(PathBuf),
    /// Appends to the shared buffer on every open.
    Memory(SharedBuffer),
}

impl OutputSink {
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        OutputSink::Writer(Some(Box::new(writer)))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        OutputSink::File(path.into())
    }

    pub fn memory(buffer: SharedBuffer) -> Self {
        OutputSink::Memory(buffer)
    }
}

impl Sink for OutputSink {
    fn open(&mut self) -> Result<BoxedOutput> {
        let writer: BoxedOutput = match self {
            OutputSink::Writer(slot) => {
                let w = slot.take().ok_or_else(|| StreamError::SinkConsumed("writer".into()))?;
                Box::new(PlainOutput::new(w))
            }
            OutputSink::File(path) => Box::new(PlainOutput::new(BufWriter::new(File::create(&*path)?))),
            OutputSink::Memory(buffer) => Box::new(buffer.writer()),
        };
        Ok(writer)
    }

    fn name(&self) -> Option<&str> {
        match self {
            OutputSink::File(path) => file_name(path),
            _ => None,
        }
    }
}

/// Gives any source or sink a name for codec lookup.
pub struct Named<T> {
    name: String,
    inner: T,
}

impl<T> Named<T> {
    pub fn new(name: impl Into<String>, inner: T) -> Self {
        Self { name: name.into(), inner }
    }
}

impl<T: Source> Source for Named<T> {
    fn open(&mut self) -> Result<BoxedInput> {
        self.inner.open()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl<T: Sink> Sink for Named<T> {
    fn open(&mut self) -> Result<BoxedOutput> {
        self.inner.open()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

// ================= Byte-level handle =================

/// Byte-level output handle produced by `as_stream`.
pub struct OutputHandle {
    stream: BoxedOutput,
}

impl OutputHandle {
    pub fn new(stream: BoxedOutput) -> Self {
        Self { stream }
    }

    /// Finalize every layer and release the leaf resource.
    pub fn close(self) -> Result<()> {
        self.stream.close()?;
        Ok(())
    }
}

impl Write for OutputHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Closeable for OutputHandle {
    fn close(self) -> Result<()> {
        OutputHandle::close(self)
    }
}
