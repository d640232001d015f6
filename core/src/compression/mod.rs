//! compression/mod.rs
//! Extension-driven compression and decompression layers.
//!
//! Notes:
//! - The registry maps file extensions to paired decode/encode wrappers.
//! - Built-in `gz` and `zip` are always present; `zst` and `lz4` are opt-in.
//! - When no codec can be inferred from a name, builders fall back to deflate.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;

pub use constants::*;
pub use types::*;
pub use registry::*;
