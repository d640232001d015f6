//! stream/layers.rs
//! Byte-level decorators shared by the builders and the codec registry.

use std::io::{self, BufWriter, Write};

use base64::engine::GeneralPurpose;
use base64::read::DecoderReader;
use base64::write::EncoderWriter;

use crate::stream::io::{close_cascade, BoxedInput, BoxedOutput, Link, OutputStream};

/// An encoder whose trailing state can be written out without consuming it.
pub trait FinishEncoding: Write + Send {
    /// Write any trailer into the link beneath. Must be safe to retry.
    fn finish_encoding(&mut self) -> io::Result<()>;

    fn link(&mut self) -> &mut Link;
}

/// Output layer around any [`FinishEncoding`] encoder.
pub struct EncoderLayer<E> {
    encoder: E,
}

impl<E: FinishEncoding> EncoderLayer<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }
}

impl<E: FinishEncoding> Write for EncoderLayer<E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.encoder.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl<E: FinishEncoding> OutputStream for EncoderLayer<E> {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        let own = self.encoder.finish_encoding();
        let inner = self.encoder.link().detach();
        close_cascade(own, inner)
    }
}

impl FinishEncoding for BufWriter<Link> {
    fn finish_encoding(&mut self) -> io::Result<()> {
        self.flush()
    }

    fn link(&mut self) -> &mut Link {
        self.get_mut()
    }
}

/// Buffer writes before they reach `inner`.
pub fn buffered(inner: BoxedOutput, capacity: usize) -> BoxedOutput {
    Box::new(EncoderLayer::new(BufWriter::with_capacity(capacity, Link::new(inner))))
}

// ================= Base64 =================

pub struct Base64Output {
    encoder: EncoderWriter<'static, GeneralPurpose, Link>,
}

impl Base64Output {
    pub fn new(inner: BoxedOutput, engine: &'static GeneralPurpose) -> Self {
        Self { encoder: EncoderWriter::new(Link::new(inner), engine) }
    }
}

impl Write for Base64Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl OutputStream for Base64Output {
    fn close(self: Box<Self>) -> io::Result<()> {
        let mut encoder = self.encoder;
        // Padding is only written by finish().
        let (own, inner) = match encoder.finish() {
            Ok(mut link) => (Ok(()), link.detach()),
            Err(e) => (Err(e), encoder.into_inner().detach()),
        };
        close_cascade(own, inner)
    }
}

pub fn base64_encode(inner: BoxedOutput, engine: &'static GeneralPurpose) -> BoxedOutput {
    Box::new(Base64Output::new(inner, engine))
}

pub fn base64_decode(inner: BoxedInput, engine: &'static GeneralPurpose) -> BoxedInput {
    Box::new(DecoderReader::new(inner, engine))
}
