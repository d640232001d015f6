//! Single-entry zip archive, streamed in both directions.
//!
//! Writing goes through `ZipWriter::new_stream`, so every entry is followed by
//! a data descriptor and nothing is held back until close. Reading walks the
//! local entry headers in order and never looks at the central directory.

use std::io::{self, BufReader, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::bufread::DeflateDecoder;
use flate2::CrcReader;
use zip::write::{SimpleFileOptions, StreamWriter};
use zip::{CompressionMethod, ZipWriter};

use crate::compression::constants::zip_format::{
    CENTRAL_HEADER_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE, END_OF_DIRECTORY_SIGNATURE, FLAG_DATA_DESCRIPTOR,
    FLAG_ENCRYPTED, LOCAL_HEADER_SIGNATURE, METHOD_DEFLATED, METHOD_STORED, ZIP64_END_OF_DIRECTORY_SIGNATURE,
    ZIP64_EXTRA_ID, ZIP64_SIZE_MARKER,
};
use crate::compression::constants::ZIP_CODEC_ENTRY;
use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::stream::io::close_cascade;
use crate::stream::{BoxedInput, BoxedOutput, Link, OutputStream};

/// Archive writer that pushes entries into the next output layer as they are written.
pub(crate) type StreamingZip = ZipWriter<StreamWriter<Link>>;

pub(crate) fn streaming_writer(inner: BoxedOutput) -> StreamingZip {
    ZipWriter::new_stream(Link::new(inner))
}

/// Deflated, zip64-capable entries; the total size is never known up front.
pub(crate) fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true)
}

/// Write the central directory, then close the layer beneath.
pub(crate) fn finish_streaming(writer: StreamingZip) -> io::Result<()> {
    let mut link = writer.finish()?.into_inner();
    close_cascade(Ok(()), link.detach())
}

/// Streams the first entry of the archive; an archive without entries reads as empty.
pub fn decode(input: BoxedInput) -> io::Result<BoxedInput> {
    match EntryReader::open(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, input))? {
        Some(entry) => {
            tracing::trace!(entry = entry.name(), "zip codec entry");
            Ok(Box::new(entry))
        }
        None => Ok(Box::new(io::empty())),
    }
}

pub fn encode(output: BoxedOutput) -> io::Result<BoxedOutput> {
    let mut writer = streaming_writer(output);
    writer.start_file(ZIP_CODEC_ENTRY, entry_options())?;
    Ok(Box::new(ZipCodecOutput { writer }))
}

struct ZipCodecOutput {
    writer: StreamingZip,
}

impl Write for ZipCodecOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl OutputStream for ZipCodecOutput {
    fn close(self: Box<Self>) -> io::Result<()> {
        finish_streaming(self.writer)
    }
}

// ================= Local entries =================

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn unsupported(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, msg)
}

#[derive(Debug)]
struct LocalHeader {
    name: String,
    flags: u16,
    method: u16,
    crc32: u32,
    compressed_size: u64,
    zip64: bool,
}

impl LocalHeader {
    /// `None` at the central directory or at the end of input.
    fn read<R: Read>(input: &mut R) -> io::Result<Option<Self>> {
        let signature = match input.read_u32::<LittleEndian>() {
            Ok(signature) => signature,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };
        match signature {
            LOCAL_HEADER_SIGNATURE => {}
            CENTRAL_HEADER_SIGNATURE | END_OF_DIRECTORY_SIGNATURE | ZIP64_END_OF_DIRECTORY_SIGNATURE => {
                return Ok(None)
            }
            other => return Err(invalid(format!("not a zip entry header: {other:#010x}"))),
        }

        let _version = input.read_u16::<LittleEndian>()?;
        let flags = input.read_u16::<LittleEndian>()?;
        let method = input.read_u16::<LittleEndian>()?;
        let _modified = input.read_u32::<LittleEndian>()?;
        let crc32 = input.read_u32::<LittleEndian>()?;
        let compressed = input.read_u32::<LittleEndian>()?;
        let uncompressed = input.read_u32::<LittleEndian>()?;
        let name_len = input.read_u16::<LittleEndian>()?;
        let extra_len = input.read_u16::<LittleEndian>()?;

        let mut name = vec![0u8; usize::from(name_len)];
        input.read_exact(&mut name)?;
        let mut extra = vec![0u8; usize::from(extra_len)];
        input.read_exact(&mut extra)?;

        let mut compressed_size = u64::from(compressed);
        let mut zip64 = false;
        let mut fields = extra.as_slice();
        while fields.len() >= 4 {
            let id = fields.read_u16::<LittleEndian>()?;
            let len = usize::from(fields.read_u16::<LittleEndian>()?).min(fields.len());
            let (field, rest) = fields.split_at(len);
            if id == ZIP64_EXTRA_ID {
                zip64 = true;
                // Sizes appear only for header fields set to the marker, uncompressed first.
                let offset = if uncompressed == ZIP64_SIZE_MARKER { 8 } else { 0 };
                if compressed == ZIP64_SIZE_MARKER && field.len() >= offset + 8 {
                    compressed_size = (&field[offset..offset + 8]).read_u64::<LittleEndian>()?;
                }
            }
            fields = rest;
        }

        Ok(Some(Self {
            name: String::from_utf8_lossy(&name).into_owned(),
            flags,
            method,
            crc32,
            compressed_size,
            zip64,
        }))
    }

    fn has_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

enum Body {
    Stored(io::Take<BufReader<BoxedInput>>),
    Deflated(DeflateDecoder<BufReader<BoxedInput>>),
}

impl Body {
    fn source(&mut self) -> &mut BufReader<BoxedInput> {
        match self {
            Body::Stored(r) => r.get_mut(),
            Body::Deflated(r) => r.get_mut(),
        }
    }

    fn into_source(self) -> BufReader<BoxedInput> {
        match self {
            Body::Stored(r) => r.into_inner(),
            Body::Deflated(r) => r.into_inner(),
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Stored(r) => r.read(buf),
            Body::Deflated(r) => r.read(buf),
        }
    }
}

/// Body of one local entry, read straight from the archive stream.
///
/// Reaching the end of the body consumes the trailing data descriptor, if any,
/// and fails with `InvalidData` when the CRC-32 does not match.
pub(crate) struct EntryReader {
    header: LocalHeader,
    body: CrcReader<Body>,
    verified: bool,
}

impl EntryReader {
    /// Read the next local header; `None` once no entries are left.
    pub(crate) fn open(mut source: BufReader<BoxedInput>) -> io::Result<Option<Self>> {
        let Some(header) = LocalHeader::read(&mut source)? else {
            return Ok(None);
        };
        if header.flags & FLAG_ENCRYPTED != 0 {
            return Err(unsupported(format!("zip entry {} is encrypted", header.name)));
        }
        let body = match header.method {
            METHOD_DEFLATED => Body::Deflated(DeflateDecoder::new(source)),
            METHOD_STORED if !header.has_descriptor() => Body::Stored(source.take(header.compressed_size)),
            METHOD_STORED => {
                return Err(unsupported(format!("stored zip entry {} has no size in its header", header.name)))
            }
            other => {
                return Err(unsupported(format!("zip entry {} uses compression method {other}", header.name)))
            }
        };
        Ok(Some(Self { header, body: CrcReader::new(body), verified: false }))
    }

    pub(crate) fn name(&self) -> &str {
        &self.header.name
    }

    /// The archive stream, positioned after this entry once it has been read to its end.
    pub(crate) fn into_source(self) -> BufReader<BoxedInput> {
        self.body.into_inner().into_source()
    }

    fn verify(&mut self) -> io::Result<()> {
        self.verified = true;
        let expected = if self.header.has_descriptor() {
            let source = self.body.get_mut().source();
            let mut crc = source.read_u32::<LittleEndian>()?;
            if crc == DATA_DESCRIPTOR_SIGNATURE {
                crc = source.read_u32::<LittleEndian>()?;
            }
            let sizes = if self.header.zip64 { 16 } else { 8 };
            io::copy(&mut (&mut *source).take(sizes), &mut io::sink())?;
            crc
        } else {
            self.header.crc32
        };

        let actual = self.body.crc().sum();
        if actual != expected {
            return Err(invalid(format!(
                "zip entry {} failed its checksum: {actual:#010x} != {expected:#010x}",
                self.header.name
            )));
        }
        Ok(())
    }
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.body.read(buf)?;
        if n == 0 && !buf.is_empty() && !self.verified {
            self.verify()?;
        }
        Ok(n)
    }
}
