//! Zstandard frames via the zstd crate.

use std::io;

use zstd::stream::{read::Decoder, write::Encoder};

use crate::compression::constants::DEFAULT_LEVEL_ZSTD;
use crate::stream::layers::{EncoderLayer, FinishEncoding};
use crate::stream::{BoxedInput, BoxedOutput, Link};

impl FinishEncoding for Encoder<'static, Link> {
    fn finish_encoding(&mut self) -> io::Result<()> {
        // Writes the epilogue; safe to call again after an error.
        self.do_finish()
    }

    fn link(&mut self) -> &mut Link {
        self.get_mut()
    }
}

pub fn decode(input: BoxedInput) -> io::Result<BoxedInput> {
    Ok(Box::new(Decoder::new(input)?))
}

pub fn encode(output: BoxedOutput) -> io::Result<BoxedOutput> {
    let encoder = Encoder::new(Link::new(output), DEFAULT_LEVEL_ZSTD)?;
    Ok(Box::new(EncoderLayer::new(encoder)))
}
