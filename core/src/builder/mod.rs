//! builder: fluent pipeline construction.
//!
//! Builders accumulate options and, on every materializing call, open their
//! leaf resource and layer the requested decorators onto it in a fixed order.

pub mod options;
pub mod output;
pub mod input;
pub mod buffer;

pub use options::{open_input_chain, open_output_chain, use_and_close, InputOptions, OutputOptions};
pub use output::OutBuilder;
pub use input::InBuilder;
pub use buffer::{BufferOutput, BufferSink, ByteOutBuilder, OutputBuffer, StringOutBuilder};
