// Codec registry: extension matching, registration semantics and compound
// name resolution order.

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::sync::{Arc, Mutex};

    use iochain_core::compression::{extensions, CodecRegistry, CompressionCodec};
    use iochain_core::stream::{BoxedInput, BoxedOutput, InputWrapper, OutputWrapper, SharedBuffer};
    use proptest::prelude::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging_decoder(log: &Log, tag: &str) -> InputWrapper {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Arc::new(move |input: BoxedInput| {
            log.lock().unwrap().push(tag.clone());
            Ok(input)
        })
    }

    fn logging_encoder(log: &Log, tag: &str) -> OutputWrapper {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Arc::new(move |output: BoxedOutput| {
            log.lock().unwrap().push(tag.clone());
            Ok(output)
        })
    }

    fn empty_input() -> BoxedInput {
        Box::new(std::io::empty())
    }

    fn buffer_output() -> BoxedOutput {
        Box::new(SharedBuffer::new().writer())
    }

    #[test]
    fn builtin_extensions_present() {
        let registry = CodecRegistry::new();
        assert!(registry.can_decode("archive.gz"));
        assert!(registry.can_encode("archive.gz"));
        assert!(registry.can_decode("bundle.zip"));
        assert!(registry.can_encode("bundle.zip"));
        assert!(!registry.can_decode("notes.txt"));
        assert!(!registry.can_encode("gz"));
        assert!(!registry.can_decode("data.zst"));
        assert_eq!(registry.extensions(), vec!["gz".to_string(), "zip".to_string()]);
    }

    #[test]
    fn extended_codecs_add_zstd_and_lz4() {
        let registry = CodecRegistry::with_extended_codecs();
        assert!(registry.can_decode("x.zst"));
        assert!(registry.can_encode("x.lz4"));
        assert!(registry.can_decode("x.gz"));
    }

    #[test]
    fn register_reports_previously_empty_slots() {
        let registry = CodecRegistry::empty();
        let log = Log::default();

        assert!(registry.register("foo", logging_decoder(&log, "d"), logging_encoder(&log, "e")));
        assert!(!registry.register("foo", logging_decoder(&log, "d2"), logging_encoder(&log, "e2")));

        // One slot filled, the other empty.
        assert!(registry.register_decoder("bar", logging_decoder(&log, "d")).is_none());
        assert!(registry.register("bar", logging_decoder(&log, "d"), logging_encoder(&log, "e")));
    }

    #[test]
    fn single_slot_registration() {
        let registry = CodecRegistry::empty();
        let log = Log::default();

        registry.register_encoder("enc", logging_encoder(&log, "e"));
        assert!(registry.can_encode("file.enc"));
        assert!(!registry.can_decode("file.enc"));

        let previous = registry.register_encoder("enc", logging_encoder(&log, "e2"));
        assert!(previous.is_some());
    }

    #[test]
    fn compound_name_applies_trailing_extension_first() {
        let registry = CodecRegistry::empty();
        let log = Log::default();
        registry.register("tar", logging_decoder(&log, "tar"), logging_encoder(&log, "tar"));
        registry.register("gz", logging_decoder(&log, "gz"), logging_encoder(&log, "gz"));

        registry.wrap_for_decode("a.tar.gz", empty_input()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["gz", "tar"]);

        log.lock().unwrap().clear();
        registry.wrap_for_encode("a.tar.gz", buffer_output()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["gz", "tar"]);
    }

    #[test]
    fn unmatched_extension_stops_resolution() {
        let registry = CodecRegistry::empty();
        let log = Log::default();
        registry.register("gz", logging_decoder(&log, "gz"), logging_encoder(&log, "gz"));

        registry.wrap_for_decode("a.xyz", empty_input()).unwrap();
        registry.wrap_for_decode("a.gz.xyz", empty_input()).unwrap();
        assert!(log.lock().unwrap().is_empty());

        registry.wrap_for_decode("a.xyz.gz", empty_input()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["gz"]);
    }

    #[test]
    fn unmatched_name_leaves_stream_untouched() {
        let registry = CodecRegistry::new();
        let mut input = registry
            .wrap_for_decode("plain.xyz", Box::new(std::io::Cursor::new(b"raw bytes".to_vec())))
            .unwrap();
        let mut out = Vec::new();
        input.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"raw bytes");
    }

    #[test]
    fn registration_visible_to_next_resolution() {
        let registry = CodecRegistry::new();
        assert!(!registry.can_decode("x.lz4"));
        let codec = CompressionCodec::Lz4;
        registry.register(extensions::LZ4, codec.decoder(), codec.encoder());
        assert!(registry.can_decode("x.lz4"));
    }

    #[test]
    fn codec_names_parse() {
        assert_eq!("gzip".parse::<CompressionCodec>().unwrap(), CompressionCodec::Gzip);
        assert_eq!("GZ".parse::<CompressionCodec>().unwrap(), CompressionCodec::Gzip);
        assert_eq!("zst".parse::<CompressionCodec>().unwrap(), CompressionCodec::Zstd);
        assert!("rar".parse::<CompressionCodec>().is_err());
    }

    proptest! {
        #[test]
        fn prop_resolution_terminates(name in "[a-z.]{0,16}") {
            let registry = CodecRegistry::empty();
            let log = Log::default();
            for ext in ["gz", "", "g"] {
                registry.register(ext, logging_decoder(&log, ext), logging_encoder(&log, ext));
            }

            registry.wrap_for_decode(&name, empty_input()).unwrap();
            let applied = log.lock().unwrap().len();
            let dots = name.matches('.').count();
            prop_assert!(applied <= dots);
        }

        #[test]
        fn prop_self_referential_names(repeat in 0usize..8) {
            let registry = CodecRegistry::empty();
            let log = Log::default();
            registry.register("gz", logging_decoder(&log, "gz"), logging_encoder(&log, "gz"));

            let name = vec!["gz"; repeat + 1].join(".");
            registry.wrap_for_encode(&name, buffer_output()).unwrap();
            prop_assert_eq!(log.lock().unwrap().len(), repeat);
        }
    }
}
