//! gzip via flate2. Concatenated members are read back as one stream.

use std::io;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::compression::constants::DEFAULT_LEVEL_GZIP;
use crate::stream::layers::{EncoderLayer, FinishEncoding};
use crate::stream::{BoxedInput, BoxedOutput, Link};

impl FinishEncoding for GzEncoder<Link> {
    fn finish_encoding(&mut self) -> io::Result<()> {
        self.try_finish()
    }

    fn link(&mut self) -> &mut Link {
        self.get_mut()
    }
}

pub fn decode(input: BoxedInput) -> io::Result<BoxedInput> {
    Ok(Box::new(MultiGzDecoder::new(input)))
}

pub fn encode(output: BoxedOutput) -> io::Result<BoxedOutput> {
    let encoder = GzEncoder::new(Link::new(output), Compression::new(DEFAULT_LEVEL_GZIP));
    Ok(Box::new(EncoderLayer::new(encoder)))
}
