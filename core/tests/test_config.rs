// Configuration parsing and context injection.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use iochain_core::constants::{env_keys, DEFAULT_BUFFER_SIZE};
    use iochain_core::prelude::*;

    #[test]
    fn defaults() {
        let config = IoConfig::new(None, None);
        assert_eq!(config, IoConfig::default());
        assert_eq!(config.default_charset, Charset::Utf8);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn out_of_range_buffer_size_falls_back() {
        assert_eq!(IoConfig::new(None, Some(0)).buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(IoConfig::new(None, Some(usize::MAX)).buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(IoConfig::default().with_buffer_size(64).buffer_size, 64);
    }

    #[test]
    fn from_json_fills_omitted_fields() {
        let config = IoConfig::from_json(r#"{ "default_charset": "utf-16le" }"#).unwrap();
        assert_eq!(config.default_charset, Charset::Utf16Le);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);

        let config = IoConfig::from_json(r#"{ "buffer_size": 0 }"#).unwrap();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn from_json_rejects_bad_input() {
        assert!(matches!(IoConfig::from_json("{ not json"), Err(StreamError::Config(_))));
        assert!(matches!(
            IoConfig::from_json(r#"{ "default_charset": "klingon" }"#),
            Err(StreamError::Config(_))
        ));
    }

    #[test]
    fn from_env_reads_both_keys() {
        std::env::set_var(env_keys::DEFAULT_CHARSET, "ISO-8859-1");
        std::env::set_var(env_keys::BUFFER_SIZE, "not-a-number");
        let config = IoConfig::from_env();
        std::env::remove_var(env_keys::DEFAULT_CHARSET);
        std::env::remove_var(env_keys::BUFFER_SIZE);

        assert_eq!(config.default_charset, Charset::Iso8859_1);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn context_charset_reaches_builders() {
        let context = IoContext::with_config(IoConfig::new(Some(Charset::Utf16Be), Some(16)));
        let bytes = ByteOutBuilder::with_context(context.clone()).write("hi").unwrap();
        assert_eq!(bytes, vec![0x00, b'h', 0x00, b'i']);

        let text = InBuilder::with_context(InputSource::memory(bytes), context).read_all().unwrap();
        assert_eq!(text, "hi");
    }

    #[test]
    fn private_registry_is_isolated() {
        let registry = Arc::new(CodecRegistry::new());
        let codec = CompressionCodec::Zstd;
        registry.register("pack", codec.decoder(), codec.encoder());
        let context = IoContext::new(IoConfig::default(), Arc::clone(&registry));

        let bytes = ByteOutBuilder::with_context(context.clone())
            .named("data.pack")
            .compress()
            .write("private codec")
            .unwrap();
        let source = Named::new("data.pack", InputSource::memory(bytes));
        let text = InBuilder::with_context(source, context).decompress().read_all().unwrap();
        assert_eq!(text, "private codec");

        assert!(!CodecRegistry::shared().can_decode("data.pack"));
    }

    #[test]
    fn serde_round_trip() {
        let config = IoConfig::new(Some(Charset::Ascii), Some(1024));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(IoConfig::from_json(&json).unwrap(), config);
    }
}
