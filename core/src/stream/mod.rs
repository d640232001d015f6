//! stream: handles and decorator layers.
//!
//! Every produced handle owns a linear chain of layers ending in a leaf
//! resource. Closing a handle closes the chain outermost-first: each layer
//! finalizes into the one beneath it, then the one beneath is closed even
//! if the outer finalize failed. The first error wins.

pub mod io;
pub mod layers;
pub mod text;
pub mod structured;

pub use io::{
    BoxedInput,
    BoxedOutput,
    InputSource,
    InputWrapper,
    Link,
    Named,
    OutputHandle,
    OutputSink,
    OutputStream,
    OutputWrapper,
    PlainOutput,
    SharedBuffer,
    Sink,
    Source,
};

pub use text::{
    BoxedTextInput,
    BoxedTextOutput,
    LineStream,
    TextInput,
    TextInputWrapper,
    TextOutput,
    TextOutputWrapper,
    TextReader,
    TextWriter,
};

pub use structured::{
    DataReader,
    DataWriter,
    ObjectReader,
    ObjectWriter,
    ZipEntry,
    ZipInput,
    ZipOutput,
};

/// A handle whose `close` finalizes and releases its whole chain.
pub trait Closeable {
    fn close(self) -> crate::types::Result<()>;
}
