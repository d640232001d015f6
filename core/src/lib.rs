//! iochain-core
//!
//! Composable, typed I/O pipeline construction.
//! Synchronous std::io only: no async runtime, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

// Transformations
pub mod charset;
pub mod compression;

// Handles and builders
pub mod stream;
pub mod builder;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::builder::{
        BufferOutput, ByteOutBuilder, InBuilder, OutBuilder, OutputBuffer, StringOutBuilder,
    };
    pub use crate::charset::Charset;
    pub use crate::compression::{CodecRegistry, CompressionCodec};
    pub use crate::config::{IoConfig, IoContext};
    pub use crate::stream::{
        Closeable, InputSource, InputWrapper, Named, OutputSink, OutputWrapper, SharedBuffer, Sink, Source,
        TextInputWrapper, TextOutputWrapper,
    };
    pub use crate::types::{Result, StreamError};
}
