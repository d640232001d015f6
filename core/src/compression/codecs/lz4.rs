//! LZ4 frame format via lz4_flex (pure Rust).

use std::io;

use lz4_flex::frame::{FrameDecoder, FrameEncoder};

use crate::stream::layers::{EncoderLayer, FinishEncoding};
use crate::stream::{BoxedInput, BoxedOutput, Link};

impl FinishEncoding for FrameEncoder<Link> {
    fn finish_encoding(&mut self) -> io::Result<()> {
        self.try_finish().map_err(io::Error::from)
    }

    fn link(&mut self) -> &mut Link {
        self.get_mut()
    }
}

pub fn decode(input: BoxedInput) -> io::Result<BoxedInput> {
    Ok(Box::new(FrameDecoder::new(input)))
}

pub fn encode(output: BoxedOutput) -> io::Result<BoxedOutput> {
    Ok(Box::new(EncoderLayer::new(FrameEncoder::new(Link::new(output)))))
}
