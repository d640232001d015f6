// ## Character-level handles
//
// Text layers sit above the byte chain: the charset encoder/decoder is the
// boundary, and caller-supplied text wrappers stack on top of it.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use crate::charset::{Charset, Decoder, Encoder};
use crate::constants::LINE_SEPARATOR;
use crate::stream::io::{close_cascade, BoxedInput, BoxedOutput};
use crate::stream::Closeable;
use crate::types::Result;

/// One layer of a character output chain. Same close contract as
/// [`OutputStream`](crate::stream::OutputStream).
pub trait TextOutput: Send {
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    fn close(self: Box<Self>) -> io::Result<()>;
}

pub type BoxedTextOutput = Box<dyn TextOutput>;

/// Decorator factory for character output.
pub type TextOutputWrapper = Arc<dyn Fn(BoxedTextOutput) -> io::Result<BoxedTextOutput> + Send + Sync>;

/// One layer of a character input chain.
pub trait TextInput: Send {
    /// Append decoded text to `buf`, returning the number of bytes appended.
    /// Returns 0 only at end of input.
    fn read_text(&mut self, buf: &mut String) -> io::Result<usize>;
}

pub type BoxedTextInput = Box<dyn TextInput>;

/// Decorator factory for character input.
pub type TextInputWrapper = Arc<dyn Fn(BoxedTextInput) -> io::Result<BoxedTextInput> + Send + Sync>;

// ================= Charset boundary =================

/// Encodes text into the byte chain beneath.
pub struct EncodingOutput {
    encoder: Encoder,
    scratch: Vec<u8>,
    inner: Option<BoxedOutput>,
}

impl EncodingOutput {
    pub fn new(inner: BoxedOutput, charset: Charset) -> Self {
        Self { encoder: charset.encoder(), scratch: Vec::new(), inner: Some(inner) }
    }
}

impl TextOutput for EncodingOutput {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "text output already closed"))?;
        self.scratch.clear();
        self.encoder.encode(text, &mut self.scratch);
        inner.write_all(&self.scratch)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }

    fn close(mut self: Box<Self>) -> io::Result<()> {
        close_cascade(Ok(()), self.inner.take())
    }
}

/// Decodes the byte chain beneath into text.
pub struct DecodingInput {
    inner: BoxedInput,
    decoder: Decoder,
    chunk: Vec<u8>,
    done: bool,
}

impl DecodingInput {
    pub fn new(inner: BoxedInput, charset: Charset, buffer_size: usize) -> Self {
        Self { inner, decoder: charset.decoder(), chunk: vec![0u8; buffer_size.max(1)], done: false }
    }
}

impl TextInput for DecodingInput {
    fn read_text(&mut self, buf: &mut String) -> io::Result<usize> {
        let start = buf.len();
        while !self.done && buf.len() == start {
            let n = self.inner.read(&mut self.chunk)?;
            if n == 0 {
                self.decoder.finish(buf);
                self.done = true;
            } else {
                self.decoder.decode(&self.chunk[..n], buf);
            }
        }
        Ok(buf.len() - start)
    }
}

// ================= Writer =================

/// Character output handle produced by `as_writer`.
pub struct TextWriter {
    out: BoxedTextOutput,
}

impl TextWriter {
    pub fn new(out: BoxedTextOutput) -> Self {
        Self { out }
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.out.write_text(text)
    }

    pub fn write_char(&mut self, c: char) -> io::Result<()> {
        let mut buf = [0u8; 4];
        self.out.write_text(c.encode_utf8(&mut buf))
    }

    pub fn new_line(&mut self) -> io::Result<()> {
        self.out.write_text(LINE_SEPARATOR)
    }

    /// Write `line` followed by the line separator.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.out.write_text(line)?;
        self.new_line()
    }

    /// Backs `write!`/`writeln!` on the writer.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match args.as_str() {
            Some(text) => self.out.write_text(text),
            None => self.out.write_text(&args.to_string()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn close(self) -> Result<()> {
        self.out.close()?;
        Ok(())
    }
}

impl fmt::Write for TextWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.write_text(s).map_err(|_| fmt::Error)
    }
}

impl Closeable for TextWriter {
    fn close(self) -> Result<()> {
        TextWriter::close(self)
    }
}

// ================= Reader =================

/// Character input handle produced by `as_reader`.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`; terminators are not returned.
pub struct TextReader {
    input: BoxedTextInput,
    pending: String,
    pos: usize,
    skip_lf: bool,
}

impl TextReader {
    pub fn new(input: BoxedTextInput) -> Self {
        Self { input, pending: String::new(), pos: 0, skip_lf: false }
    }

    /// Make unread text available. Returns false at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.pending.len() {
            return Ok(true);
        }
        self.pending.clear();
        self.pos = 0;
        while self.pending.is_empty() {
            if self.input.read_text(&mut self.pending)? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Drop the `\n` of a `\r\n` pair split across reads.
    fn skip_pending_lf(&mut self) {
        if self.skip_lf && self.pos < self.pending.len() {
            if self.pending.as_bytes()[self.pos] == b'\n' {
                self.pos += 1;
            }
            self.skip_lf = false;
        }
    }

    /// Next line, or `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let mut started = false;
        loop {
            if !self.fill()? {
                return Ok(started.then_some(line));
            }
            self.skip_pending_lf();
            let rest = &self.pending[self.pos..];
            match rest.find(|c: char| c == '\n' || c == '\r') {
                Some(i) => {
                    line.push_str(&rest[..i]);
                    self.skip_lf = rest.as_bytes()[i] == b'\r';
                    self.pos += i + 1;
                    return Ok(Some(line));
                }
                None => {
                    started |= !rest.is_empty();
                    line.push_str(rest);
                    self.pos = self.pending.len();
                }
            }
        }
    }

    /// Append the next available run of text to `buf`, separators included.
    /// Returns 0 only at end of input.
    pub fn read_chunk(&mut self, buf: &mut String) -> io::Result<usize> {
        loop {
            if !self.fill()? {
                return Ok(0);
            }
            self.skip_pending_lf();
            if self.pos < self.pending.len() {
                break;
            }
        }
        let rest = &self.pending[self.pos..];
        buf.push_str(rest);
        self.pos = self.pending.len();
        Ok(rest.len())
    }

    /// Everything left, separators included.
    pub fn read_to_string(&mut self) -> io::Result<String> {
        let mut all = String::new();
        while self.read_chunk(&mut all)? > 0 {}
        Ok(all)
    }

    pub fn lines(self) -> LineStream {
        LineStream { reader: Some(self) }
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

impl Closeable for TextReader {
    fn close(self) -> Result<()> {
        TextReader::close(self)
    }
}

/// Lazy, single-pass sequence of lines.
///
/// The underlying reader is released when the sequence is exhausted, fails,
/// is closed, or is dropped.
pub struct LineStream {
    reader: Option<TextReader>,
}

impl LineStream {
    /// Whether the underlying reader is still held.
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn close(mut self) -> Result<()> {
        match self.reader.take() {
            Some(reader) => reader.close(),
            None => Ok(()),
        }
    }
}

impl Iterator for LineStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        match reader.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.reader = None;
                None
            }
            Err(e) => {
                self.reader = None;
                Some(Err(e.into()))
            }
        }
    }
}

impl Closeable for LineStream {
    fn close(self) -> Result<()> {
        LineStream::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out one character per call to exercise split terminators.
    struct Trickle(Vec<char>);

    impl TextInput for Trickle {
        fn read_text(&mut self, buf: &mut String) -> io::Result<usize> {
            if self.0.is_empty() {
                return Ok(0);
            }
            let c = self.0.remove(0);
            buf.push(c);
            Ok(c.len_utf8())
        }
    }

    fn reader(text: &str) -> TextReader {
        TextReader::new(Box::new(Trickle(text.chars().collect())))
    }

    #[test]
    fn mixed_terminators() {
        let lines: Vec<String> = reader("a\r\nb\rc\n\nd").lines().collect::<Result<_>>().unwrap();
        assert_eq!(lines, vec!["a", "b", "c", "", "d"]);
    }

    #[test]
    fn trailing_separator_adds_no_line() {
        let lines: Vec<String> = reader("x\n").lines().collect::<Result<_>>().unwrap();
        assert_eq!(lines, vec!["x"]);
        assert_eq!(reader("").lines().count(), 0);
    }

    #[test]
    fn decoding_input_handles_split_sequences() {
        let bytes = "grüße".as_bytes().to_vec();
        let input = DecodingInput::new(Box::new(Cursor::new(bytes)), Charset::Utf8, 1);
        let mut r = TextReader::new(Box::new(input));
        assert_eq!(r.read_to_string().unwrap(), "grüße");
    }

    #[test]
    fn line_stream_releases_reader_when_exhausted() {
        let mut lines = reader("one\ntwo").lines();
        assert!(lines.is_open());
        assert_eq!(lines.next().unwrap().unwrap(), "one");
        assert_eq!(lines.next().unwrap().unwrap(), "two");
        assert!(lines.next().is_none());
        assert!(!lines.is_open());
    }
}
