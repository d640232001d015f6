//! Deflate (zlib wrapper) via flate2 with streaming enc/dec.

use std::io;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::compression::constants::DEFAULT_LEVEL_DEFLATE;
use crate::stream::layers::{EncoderLayer, FinishEncoding};
use crate::stream::{BoxedInput, BoxedOutput, Link};

impl FinishEncoding for ZlibEncoder<Link> {
    fn finish_encoding(&mut self) -> io::Result<()> {
        self.try_finish()
    }

    fn link(&mut self) -> &mut Link {
        self.get_mut()
    }
}

pub fn decode(input: BoxedInput) -> io::Result<BoxedInput> {
    Ok(Box::new(ZlibDecoder::new(input)))
}

pub fn encode(output: BoxedOutput) -> io::Result<BoxedOutput> {
    let encoder = ZlibEncoder::new(Link::new(output), Compression::new(DEFAULT_LEVEL_DEFLATE));
    Ok(Box::new(EncoderLayer::new(encoder)))
}
