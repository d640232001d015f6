//! constants.rs
//! Shared defaults for buffers, separators and configuration keys.

/// Defaults when Option<T> is None
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024; // 8 KiB

/// Upper bound accepted for configured buffer sizes (16 MiB).
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Separator written between lines and used when joining lines back together.
pub const LINE_SEPARATOR: &str = "\n";

/// Upper bound for the initial allocation of a length-prefixed record sequence.
pub const MAX_PREALLOCATED_RECORDS: usize = 1024;

/// Upper bound for the initial allocation of a length-prefixed byte string.
pub const MAX_PREALLOCATED_BYTES: usize = 64 * 1024;

/// Environment variables consulted by `IoConfig::from_env`.
pub mod env_keys {
    pub const DEFAULT_CHARSET: &str = "IOCHAIN_DEFAULT_CHARSET";
    pub const BUFFER_SIZE: &str = "IOCHAIN_BUFFER_SIZE";
}
