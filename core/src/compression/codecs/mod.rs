//! compression/codecs/mod.rs
//! Stream wrappers for each built-in codec.
//!
//! Every module exposes the same pair of plain functions:
//! - `decode(BoxedInput) -> io::Result<BoxedInput>`
//! - `encode(BoxedOutput) -> io::Result<BoxedOutput>`
//!
//! Encoders finish their trailer into the layer beneath on close and then
//! close that layer.

pub mod deflate;
pub mod gzip;
pub mod lz4;
pub mod zip;
pub mod zstd;
