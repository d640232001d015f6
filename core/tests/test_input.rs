// Input builder: line reading, decompression, base64, wrapper placement and
// single-use sources.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{self, Read, Write};
    use std::sync::Arc;

    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use iochain_core::prelude::*;
    use iochain_core::stream::{BoxedInput, BoxedTextInput, TextInput};
    use tempfile::tempdir;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    fn zlib(bytes: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    /// Archive written with a seekable writer, so sizes sit in the local headers.
    fn seekable_zip(entries: &[(&str, &[u8], zip::CompressionMethod)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        for (name, data, method) in entries {
            let options = zip::write::SimpleFileOptions::default().compression_method(*method);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// XORs every byte read through it.
    struct XorInput {
        key: u8,
        inner: BoxedInput,
    }

    impl Read for XorInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            buf[..n].iter_mut().for_each(|b| *b ^= self.key);
            Ok(n)
        }
    }

    struct Lower(BoxedTextInput);

    impl TextInput for Lower {
        fn read_text(&mut self, buf: &mut String) -> io::Result<usize> {
            let mut chunk = String::new();
            let n = self.0.read_text(&mut chunk)?;
            buf.push_str(&chunk.to_lowercase());
            Ok(n)
        }
    }

    #[test]
    fn read_all_joins_lines_without_trailing_separator() {
        assert_eq!(InBuilder::string("").read_all().unwrap(), "");
        assert_eq!(InBuilder::string("x\ny").read_all().unwrap(), "x\ny");
        assert_eq!(InBuilder::string("x\r\ny\n").read_all().unwrap(), "x\ny");
        assert_eq!(InBuilder::string("x\ny").read_lines().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn blank_lines_are_kept() {
        let lines = InBuilder::string("a\n\n\rb\r").read_lines().unwrap();
        assert_eq!(lines, vec!["a", "", "", "b"]);
    }

    #[test]
    fn decompress_by_file_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt.gz");
        fs::write(&path, gzip(b"first\nsecond")).unwrap();

        let lines = InBuilder::file(&path).decompress().read_lines().unwrap();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn decompress_unnamed_source_falls_back_to_inflate() {
        let text = InBuilder::bytes(zlib(b"inflated")).decompress().read_all().unwrap();
        assert_eq!(text, "inflated");
    }

    #[test]
    fn decompress_named_source() {
        let source = Named::new("feed.gz", InputSource::memory(gzip(b"named feed")));
        let text = InBuilder::new(source).decompress().read_all().unwrap();
        assert_eq!(text, "named feed");
    }

    #[test]
    fn uncompressed_name_is_left_alone_without_decompress() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.gz");
        let packed = gzip(b"kept");
        fs::write(&path, &packed).unwrap();
        assert_eq!(InBuilder::file(&path).read_bytes().unwrap(), packed);
    }

    #[test]
    fn decode_base64_text() {
        let text = InBuilder::string("aGVsbG8gd29ybGQ=").decode_base64().read_all().unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn raw_wrappers_sit_nearest_the_source() {
        let scrambled: Vec<u8> = gzip(b"wrapped").into_iter().map(|b| b ^ 0x5A).collect();
        let text = InBuilder::bytes(scrambled)
            .wrap(Arc::new(|inner: BoxedInput| {
                let layer: BoxedInput = Box::new(XorInput { key: 0x5A, inner });
                Ok(layer)
            }))
            .decompress_with(CompressionCodec::Gzip.decoder())
            .read_all()
            .unwrap();
        assert_eq!(text, "wrapped");
    }

    #[test]
    fn text_wrappers_apply_after_charset() {
        let text = InBuilder::string_with("LOUD Text", Charset::Utf16Le)
            .wrap_text(Arc::new(|inner: BoxedTextInput| {
                let layer: BoxedTextInput = Box::new(Lower(inner));
                Ok(layer)
            }))
            .read_all()
            .unwrap();
        assert_eq!(text, "loud text");
    }

    #[test]
    fn single_use_reader_cannot_be_reopened() {
        let mut input = InBuilder::reader(io::Cursor::new(b"only once".to_vec()));
        assert_eq!(input.read_all().unwrap(), "only once");

        let err = input.read_all().unwrap_err();
        assert!(matches!(err, StreamError::SourceConsumed(_)), "{err}");
    }

    #[test]
    fn repeatable_sources_reopen() {
        let mut input = InBuilder::bytes(b"again".to_vec());
        assert_eq!(input.read_all().unwrap(), "again");
        assert_eq!(input.read_all().unwrap(), "again");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = InBuilder::file(dir.path().join("absent.txt")).read_all().unwrap_err();
        assert!(matches!(err, StreamError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn stream_lines_is_lazy_and_releases_reader() {
        let mut lines = InBuilder::string("one\ntwo\nthree").stream_lines().unwrap();
        assert_eq!(lines.next().unwrap().unwrap(), "one");
        assert!(lines.is_open());
        let rest: Vec<String> = lines.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(rest, vec!["two", "three"]);
        assert!(!lines.is_open());

        let partial = InBuilder::string("a\nb").stream_lines().unwrap();
        partial.close().unwrap();
    }

    #[test]
    fn copy_to_and_copy_text_to() {
        let mut bytes = Vec::new();
        let n = InBuilder::bytes(gzip(b"abc")).decompress_with(CompressionCodec::Gzip.decoder()).copy_to(&mut bytes).unwrap();
        assert_eq!(n, 3);
        assert_eq!(bytes, b"abc");

        let mut text = String::from(">");
        InBuilder::string_with("line\r\nnext", Charset::Utf16Be).copy_text_to(&mut text).unwrap();
        assert_eq!(text, ">line\r\nnext");
    }

    #[test]
    fn failing_wrapper_factory_is_reported() {
        let err = InBuilder::bytes(b"unused".to_vec())
            .wrap(Arc::new(|_inner: BoxedInput| -> io::Result<BoxedInput> {
                Err(io::Error::new(io::ErrorKind::Other, "wrapper refused"))
            }))
            .as_stream()
            .err()
            .unwrap();
        assert!(matches!(err, StreamError::Io(ref e) if e.to_string() == "wrapper refused"), "{err}");
    }

    #[test]
    fn failing_codec_factory_is_reported() {
        let err = InBuilder::bytes(b"definitely not an archive".to_vec())
            .decompress_with(CompressionCodec::Zip.decoder())
            .as_stream()
            .err()
            .unwrap();
        assert!(matches!(err, StreamError::Io(ref e) if e.kind() == io::ErrorKind::InvalidData), "{err}");
    }

    #[test]
    fn zip_codec_reads_sizes_from_local_headers() {
        let stored = seekable_zip(&[("plain.txt", &b"stored body"[..], zip::CompressionMethod::Stored)]);
        let text = InBuilder::bytes(stored).decompress_with(CompressionCodec::Zip.decoder()).read_all().unwrap();
        assert_eq!(text, "stored body");

        let deflated = seekable_zip(&[
            ("a.txt", &b"first"[..], zip::CompressionMethod::Deflated),
            ("b.txt", &b"second"[..], zip::CompressionMethod::Deflated),
        ]);
        let text = InBuilder::bytes(deflated).decompress_with(CompressionCodec::Zip.decoder()).read_all().unwrap();
        assert_eq!(text, "first");
    }

    #[test]
    fn zip_codec_rejects_corrupt_entry() {
        let mut archive = seekable_zip(&[("plain.txt", &b"stored body"[..], zip::CompressionMethod::Stored)]);
        let at = archive.windows(11).position(|w| w == b"stored body").unwrap();
        archive[at] ^= 0xFF;

        let err = InBuilder::bytes(archive)
            .decompress_with(CompressionCodec::Zip.decoder())
            .read_bytes()
            .unwrap_err();
        assert!(matches!(err, StreamError::Io(ref e) if e.kind() == io::ErrorKind::InvalidData), "{err}");
    }

    #[test]
    fn empty_zip_archive_reads_as_empty() {
        let empty = zip::ZipWriter::new(io::Cursor::new(Vec::new())).finish().unwrap().into_inner();
        let bytes = InBuilder::bytes(empty).decompress_with(CompressionCodec::Zip.decoder()).read_bytes().unwrap();
        assert!(bytes.is_empty());
    }
}
