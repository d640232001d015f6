// ## Structured handles: records, primitives and zip archives

use std::io::{self, BufReader, Read, Write};

use bincode::config;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zip::result::ZipError;

use crate::compression::codecs::zip::{entry_options, finish_streaming, streaming_writer, EntryReader, StreamingZip};
use crate::constants::{MAX_PREALLOCATED_BYTES, MAX_PREALLOCATED_RECORDS};
use crate::stream::io::{BoxedInput, BoxedOutput};
use crate::stream::Closeable;
use crate::types::{Result, StreamError};

// ================= Records =================

/// Codec name reported when a sequence length prefix cannot be handled.
pub const RECORDS_CODEC: &str = "records";

/// Writes serde records with bincode's standard configuration.
///
/// A sequence written by [`write_objects`](Self::write_objects) is prefixed
/// with its length so [`ObjectReader::read_objects`] can read it back whole.
/// Error indices count records written through this handle; length prefixes
/// are not records.
pub struct ObjectWriter {
    out: BoxedOutput,
    written: usize,
}

impl ObjectWriter {
    pub fn new(out: BoxedOutput) -> Self {
        Self { out, written: 0 }
    }

    fn encode<T: Serialize + ?Sized>(&mut self, value: &T, index: usize) -> Result<()> {
        bincode::serde::encode_into_std_write(value, &mut self.out, config::standard())
            .map(|_| ())
            .map_err(|e| StreamError::ObjectEncode { index, msg: e.to_string() })
    }

    pub fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.encode(value, self.written)?;
        self.written += 1;
        Ok(())
    }

    /// Write a length-prefixed sequence. A failure names the element index.
    pub fn write_objects<T: Serialize>(&mut self, values: &[T]) -> Result<()> {
        bincode::serde::encode_into_std_write(values.len() as u64, &mut self.out, config::standard())
            .map_err(|e| StreamError::codec(RECORDS_CODEC, format!("sequence length: {e}")))?;
        for value in values {
            self.write_object(value)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.out.close()?;
        Ok(())
    }
}

impl Closeable for ObjectWriter {
    fn close(self) -> Result<()> {
        ObjectWriter::close(self)
    }
}

pub struct ObjectReader {
    input: BufReader<BoxedInput>,
    read: usize,
}

impl ObjectReader {
    pub fn new(input: BoxedInput, buffer_size: usize) -> Self {
        Self { input: BufReader::with_capacity(buffer_size, input), read: 0 }
    }

    fn decode<T: DeserializeOwned>(&mut self, index: usize) -> Result<T> {
        bincode::serde::decode_from_std_read(&mut self.input, config::standard())
            .map_err(|e| StreamError::ObjectDecode { index, msg: e.to_string() })
    }

    pub fn read_object<T: DeserializeOwned>(&mut self) -> Result<T> {
        let value = self.decode(self.read)?;
        self.read += 1;
        Ok(value)
    }

    /// Read a sequence written by [`ObjectWriter::write_objects`].
    ///
    /// On a fresh reader a failure on element `i` reports index `i`.
    pub fn read_objects<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        let len: u64 = bincode::serde::decode_from_std_read(&mut self.input, config::standard())
            .map_err(|e| StreamError::codec(RECORDS_CODEC, format!("sequence length: {e}")))?;
        let len = usize::try_from(len)
            .map_err(|_| StreamError::codec(RECORDS_CODEC, format!("sequence length {len} out of range")))?;
        let mut values = Vec::with_capacity(len.min(MAX_PREALLOCATED_RECORDS));
        for _ in 0..len {
            values.push(self.read_object()?);
        }
        Ok(values)
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

// ================= Primitives =================

/// Big-endian primitive writer. Strings carry a u32 byte-length prefix.
pub struct DataWriter {
    out: BoxedOutput,
}

impl DataWriter {
    pub fn new(out: BoxedOutput) -> Self {
        Self { out }
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        Ok(self.out.write_u8(u8::from(v))?)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        Ok(self.out.write_u8(v)?)
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        Ok(self.out.write_i8(v)?)
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        Ok(self.out.write_u16::<BigEndian>(v)?)
    }

    pub fn write_i16(&mut self, v: i16) -> Result<()> {
        Ok(self.out.write_i16::<BigEndian>(v)?)
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        Ok(self.out.write_u32::<BigEndian>(v)?)
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        Ok(self.out.write_i32::<BigEndian>(v)?)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        Ok(self.out.write_u64::<BigEndian>(v)?)
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        Ok(self.out.write_i64::<BigEndian>(v)?)
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        Ok(self.out.write_f32::<BigEndian>(v)?)
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        Ok(self.out.write_f64::<BigEndian>(v)?)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.out.write_all(bytes)?)
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let len = u32::try_from(s.len())
            .map_err(|_| StreamError::Io(io::Error::new(io::ErrorKind::InvalidInput, "string too long")))?;
        self.write_u32(len)?;
        self.write_bytes(s.as_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }

    pub fn close(self) -> Result<()> {
        self.out.close()?;
        Ok(())
    }
}

impl Write for DataWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Closeable for DataWriter {
    fn close(self) -> Result<()> {
        DataWriter::close(self)
    }
}

pub struct DataReader {
    input: BufReader<BoxedInput>,
}

impl DataReader {
    pub fn new(input: BoxedInput, buffer_size: usize) -> Self {
        Self { input: BufReader::with_capacity(buffer_size, input) }
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.input.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.input.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.input.read_i8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.input.read_u16::<BigEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.input.read_i16::<BigEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.input.read_u32::<BigEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.input.read_i32::<BigEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.input.read_u64::<BigEndian>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.input.read_i64::<BigEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.input.read_f32::<BigEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.input.read_f64::<BigEndian>()?)
    }

    /// Exactly `len` bytes. Memory grows with the bytes actually present, so a
    /// corrupt length fails at end of input instead of reserving `len` up front.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOCATED_BYTES));
        let read = (&mut self.input).take(len as u64).read_to_end(&mut buf)?;
        if read < len {
            return Err(StreamError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, found {read}"),
            )));
        }
        Ok(buf)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| StreamError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

impl Read for DataReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

// ================= Zip archives =================

/// Multi-entry zip writer. Entries stream into the chain as they are written;
/// closing writes the central directory and closes the chain.
pub struct ZipOutput {
    writer: StreamingZip,
    entries: usize,
}

impl ZipOutput {
    pub fn new(inner: BoxedOutput) -> Self {
        Self { writer: streaming_writer(inner), entries: 0 }
    }

    /// Begin a new entry; following writes go into it.
    pub fn start_entry(&mut self, name: &str) -> Result<()> {
        self.writer.start_file(name, entry_options())?;
        self.entries += 1;
        Ok(())
    }

    /// Convenience for `start_entry` followed by a single write.
    pub fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.start_entry(name)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        let Self { writer, entries } = self;
        let finished = finish_streaming(writer);
        tracing::debug!(entries, ok = finished.is_ok(), "zip archive written");
        finished?;
        Ok(())
    }
}

impl Write for ZipOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Closeable for ZipOutput {
    fn close(self) -> Result<()> {
        ZipOutput::close(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Forward-only zip reader. Entries come off the chain in archive order and
/// only the entry being returned is held in memory.
pub struct ZipInput {
    source: Option<BufReader<BoxedInput>>,
}

impl ZipInput {
    pub fn new(input: BoxedInput, buffer_size: usize) -> Self {
        Self { source: Some(BufReader::with_capacity(buffer_size, input)) }
    }

    /// Entries in archive order; `None` once all have been returned.
    pub fn next_entry(&mut self) -> Result<Option<ZipEntry>> {
        self.advance(None)
    }

    /// Skip ahead to the entry called `name`. Entries before it are consumed
    /// without being kept, so earlier entries cannot be revisited.
    pub fn read_entry(&mut self, name: &str) -> Result<ZipEntry> {
        self.advance(Some(name))?
            .ok_or(StreamError::Archive(ZipError::FileNotFound))
    }

    fn advance(&mut self, wanted: Option<&str>) -> Result<Option<ZipEntry>> {
        loop {
            let Some(source) = self.source.take() else {
                return Ok(None);
            };
            let Some(mut entry) = EntryReader::open(source)? else {
                return Ok(None);
            };

            let hit = wanted.map_or(true, |name| entry.name() == name);
            let mut data = Vec::new();
            if hit {
                entry.read_to_end(&mut data)?;
            } else {
                io::copy(&mut entry, &mut io::sink())?;
            }
            let name = entry.name().to_string();
            tracing::trace!(entry = %name, skipped = !hit, "zip entry");
            self.source = Some(entry.into_source());

            if hit {
                return Ok(Some(ZipEntry { name, data }));
            }
        }
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

impl Iterator for ZipInput {
    type Item = Result<ZipEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
