//! compression/constants.rs
//! File extensions and default levels for the built-in codecs.

/// Extensions the registry resolves out of the box.
pub mod extensions {
    pub const GZIP: &str = "gz";
    pub const ZIP: &str = "zip";
    /// Only registered by `CodecRegistry::with_extended_codecs`.
    pub const ZSTD: &str = "zst";
    /// Only registered by `CodecRegistry::with_extended_codecs`.
    pub const LZ4: &str = "lz4";
}

/// Default compression levels (balanced).
pub const DEFAULT_LEVEL_GZIP: u32 = 6;
pub const DEFAULT_LEVEL_DEFLATE: u32 = 6;
pub const DEFAULT_LEVEL_ZSTD: i32 = 6;

/// Entry name used by the `zip` codec for its single archive member.
pub const ZIP_CODEC_ENTRY: &str = "data";

/// Local entry layout used to stream zip archives without the central directory.
pub mod zip_format {
    pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
    pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
    pub const END_OF_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;
    pub const ZIP64_END_OF_DIRECTORY_SIGNATURE: u32 = 0x0606_4b50;
    pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

    pub const FLAG_ENCRYPTED: u16 = 1;
    pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

    pub const METHOD_STORED: u16 = 0;
    pub const METHOD_DEFLATED: u16 = 8;

    pub const ZIP64_EXTRA_ID: u16 = 0x0001;
    pub const ZIP64_SIZE_MARKER: u32 = u32::MAX;
}
