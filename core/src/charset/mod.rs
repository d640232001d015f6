//! charset/mod.rs
//! Character set identifiers plus incremental encoders/decoders.
//!
//! Notes:
//! - Decoders are streaming-safe: multi-byte sequences split across reads are carried over.
//! - Malformed input decodes to U+FFFD; unmappable characters encode to `?`.

pub mod types;
pub mod codec;

pub use types::*;
pub use codec::*;
