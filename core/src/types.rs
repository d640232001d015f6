use std::io;

use thiserror::Error;

/// Unified pipeline error covering I/O, codec, record, archive and misuse failures.
/// - Ergonomic `From<T>` impls enable `?` across the builders and handles.
/// - Converts back into `io::Error` so it can travel through `Read`/`Write` impls.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Opening the leaf resource or moving bytes through the chain failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A decorator could not be constructed or finalized.
    #[error("codec {codec} failed: {msg}")]
    Codec { codec: String, msg: String },

    /// Serializing the record at `index` failed.
    #[error("failed to encode object {index}: {msg}")]
    ObjectEncode { index: usize, msg: String },

    /// Deserializing the record at `index` failed.
    #[error("failed to decode object {index}: {msg}")]
    ObjectDecode { index: usize, msg: String },

    /// Zip archive handle failure.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A single-use source was opened a second time.
    #[error("source already consumed: {0}")]
    SourceConsumed(String),

    /// A single-use sink was opened a second time.
    #[error("sink already consumed: {0}")]
    SinkConsumed(String),

    /// Invalid configuration input.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    pub fn codec(codec: impl Into<String>, msg: impl std::fmt::Display) -> Self {
        StreamError::Codec { codec: codec.into(), msg: msg.to_string() }
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(inner) => inner,
            StreamError::Archive(zip::result::ZipError::Io(inner)) => inner,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
