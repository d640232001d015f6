//! builder/options.rs
//! Option sets and the chain assembly shared by every builder.
//!
//! Output order: sink → base64 → compression → raw wrappers
//!               (text: → buffer → charset encoder → text wrappers).
//! Input order:  source → raw wrappers → decompression → base64 decode
//!               (text: → charset decoder → text wrappers).

use base64::engine::general_purpose::STANDARD;
use base64::engine::GeneralPurpose;

use crate::charset::Charset;
use crate::compression::CompressionCodec;
use crate::config::IoContext;
use crate::stream::layers::{base64_decode, base64_encode, buffered};
use crate::stream::text::{DecodingInput, EncodingOutput};
use crate::stream::{
    BoxedInput, BoxedOutput, BoxedTextInput, BoxedTextOutput, Closeable, InputWrapper, OutputWrapper,
    Sink, Source, TextInputWrapper, TextOutputWrapper, TextReader, TextWriter,
};
use crate::types::Result;

/// Everything an output builder accumulates before materializing.
#[derive(Clone)]
pub struct OutputOptions {
    pub charset: Charset,
    pub compress: bool,
    /// Explicit compression codec; `None` defers to the sink name.
    pub codec: Option<OutputWrapper>,
    pub base64: bool,
    pub base64_engine: &'static GeneralPurpose,
    pub wrappers: Vec<OutputWrapper>,
    pub text_wrappers: Vec<TextOutputWrapper>,
}

impl OutputOptions {
    pub fn new(charset: Charset) -> Self {
        Self {
            charset,
            compress: false,
            codec: None,
            base64: false,
            base64_engine: &STANDARD,
            wrappers: Vec::new(),
            text_wrappers: Vec::new(),
        }
    }
}

/// Everything an input builder accumulates before materializing.
#[derive(Clone)]
pub struct InputOptions {
    pub charset: Charset,
    pub decompress: bool,
    /// Explicit decompression codec; `None` defers to the source name.
    pub codec: Option<InputWrapper>,
    pub base64: bool,
    pub base64_engine: &'static GeneralPurpose,
    pub wrappers: Vec<InputWrapper>,
    pub text_wrappers: Vec<TextInputWrapper>,
}

impl InputOptions {
    pub fn new(charset: Charset) -> Self {
        Self {
            charset,
            decompress: false,
            codec: None,
            base64: false,
            base64_engine: &STANDARD,
            wrappers: Vec::new(),
            text_wrappers: Vec::new(),
        }
    }
}

/// Open `sink` and layer the byte-level decorators onto it.
pub fn open_output_chain<S: Sink + ?Sized>(
    sink: &mut S,
    options: &OutputOptions,
    context: &IoContext,
) -> Result<BoxedOutput> {
    let mut out = sink.open()?;
    let mut layers: Vec<&str> = Vec::new();

    if options.base64 {
        out = base64_encode(out, options.base64_engine);
        layers.push("base64");
    }

    if options.compress {
        let registry = context.registry();
        out = match (&options.codec, sink.name()) {
            (Some(codec), _) => {
                layers.push("explicit-codec");
                codec(out)?
            }
            (None, Some(name)) if registry.can_encode(name) => {
                layers.push("registry");
                registry.wrap_for_encode(name, out)?
            }
            _ => {
                layers.push(CompressionCodec::Deflate.name());
                CompressionCodec::Deflate.wrap_output(out)?
            }
        };
    }

    for wrapper in &options.wrappers {
        out = wrapper(out)?;
    }

    tracing::debug!(
        sink = sink.name().unwrap_or("<unnamed>"),
        ?layers,
        wrappers = options.wrappers.len(),
        "output chain assembled"
    );
    Ok(out)
}

/// Open `source` and layer the byte-level decorators onto it.
pub fn open_input_chain<S: Source + ?Sized>(
    source: &mut S,
    options: &InputOptions,
    context: &IoContext,
) -> Result<BoxedInput> {
    let mut input = source.open()?;
    let mut layers: Vec<&str> = Vec::new();

    for wrapper in &options.wrappers {
        input = wrapper(input)?;
    }

    if options.decompress {
        let registry = context.registry();
        input = match (&options.codec, source.name()) {
            (Some(codec), _) => {
                layers.push("explicit-codec");
                codec(input)?
            }
            (None, Some(name)) if registry.can_decode(name) => {
                layers.push("registry");
                registry.wrap_for_decode(name, input)?
            }
            _ => {
                layers.push(CompressionCodec::Deflate.name());
                CompressionCodec::Deflate.wrap_input(input)?
            }
        };
    }

    if options.base64 {
        input = base64_decode(input, options.base64_engine);
        layers.push("base64");
    }

    tracing::debug!(
        source = source.name().unwrap_or("<unnamed>"),
        ?layers,
        wrappers = options.wrappers.len(),
        "input chain assembled"
    );
    Ok(input)
}

/// Charset encoder plus text wrappers on top of a byte chain.
pub fn text_writer(stream: BoxedOutput, options: &OutputOptions, context: &IoContext) -> Result<TextWriter> {
    let buffered = buffered(stream, context.buffer_size());
    let mut out: BoxedTextOutput = Box::new(EncodingOutput::new(buffered, options.charset));
    for wrapper in &options.text_wrappers {
        out = wrapper(out)?;
    }
    Ok(TextWriter::new(out))
}

/// Charset decoder plus text wrappers on top of a byte chain.
pub fn text_reader(stream: BoxedInput, options: &InputOptions, context: &IoContext) -> Result<TextReader> {
    let mut input: BoxedTextInput = Box::new(DecodingInput::new(stream, options.charset, context.buffer_size()));
    for wrapper in &options.text_wrappers {
        input = wrapper(input)?;
    }
    Ok(TextReader::new(input))
}

/// Run `op` on `handle`, then close it whatever `op` returned.
/// The operation's error wins over a close error.
pub fn use_and_close<H: Closeable, T>(mut handle: H, op: impl FnOnce(&mut H) -> Result<T>) -> Result<T> {
    let result = op(&mut handle);
    let closed = handle.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(lost)) => {
            tracing::warn!(error = %lost, "close failed after operation error");
            Err(e)
        }
    }
}

/// Fluent charset setters for any builder exposing `options_mut()` and `context()`.
macro_rules! charset_options {
    () => {
        pub fn with_charset(mut self, charset: $crate::charset::Charset) -> Self {
            self.options_mut().charset = charset;
            self
        }

        /// Unknown names fall back to the context's default charset.
        pub fn with_charset_name(mut self, name: &str) -> Self {
            let charset = $crate::charset::resolve_charset_name(name, self.context().default_charset());
            self.options_mut().charset = charset;
            self
        }

        pub fn with_utf8(self) -> Self {
            self.with_charset($crate::charset::Charset::Utf8)
        }

        pub fn with_utf16(self) -> Self {
            self.with_charset($crate::charset::Charset::Utf16)
        }

        pub fn with_utf16be(self) -> Self {
            self.with_charset($crate::charset::Charset::Utf16Be)
        }

        pub fn with_utf16le(self) -> Self {
            self.with_charset($crate::charset::Charset::Utf16Le)
        }

        pub fn with_ascii(self) -> Self {
            self.with_charset($crate::charset::Charset::Ascii)
        }

        pub fn with_iso_8859_1(self) -> Self {
            self.with_charset($crate::charset::Charset::Iso8859_1)
        }

        pub fn charset(&self) -> $crate::charset::Charset {
            self.options().charset
        }
    };
}

/// Fluent output-side transformation setters.
macro_rules! output_options {
    () => {
        /// Compress with the codec the sink name resolves to, else deflate.
        pub fn compress(mut self) -> Self {
            self.options_mut().compress = true;
            self
        }

        pub fn compress_with(mut self, codec: $crate::stream::OutputWrapper) -> Self {
            let options = self.options_mut();
            options.compress = true;
            options.codec = Some(codec);
            self
        }

        pub fn encode_base64(mut self) -> Self {
            self.options_mut().base64 = true;
            self
        }

        pub fn encode_base64_with(mut self, engine: &'static base64::engine::GeneralPurpose) -> Self {
            let options = self.options_mut();
            options.base64 = true;
            options.base64_engine = engine;
            self
        }

        /// Append a byte-level decorator, applied after compression.
        pub fn wrap(mut self, wrapper: $crate::stream::OutputWrapper) -> Self {
            self.options_mut().wrappers.push(wrapper);
            self
        }

        /// Append a character-level decorator, applied after the charset encoder.
        pub fn wrap_text(mut self, wrapper: $crate::stream::TextOutputWrapper) -> Self {
            self.options_mut().text_wrappers.push(wrapper);
            self
        }
    };
}

pub(crate) use charset_options;
pub(crate) use output_options;
