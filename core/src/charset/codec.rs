//! charset/codec.rs
//! Incremental charset encoder and decoder.

use std::char::REPLACEMENT_CHARACTER;

use crate::charset::types::Charset;

const UTF16_BOM_BE: [u8; 2] = [0xFE, 0xFF];
const UTF16_BOM_LE: [u8; 2] = [0xFF, 0xFE];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Endian {
    Big,
    Little,
}

/// Streaming encoder. Emits the byte order mark once for `Charset::Utf16`.
#[derive(Debug, Clone)]
pub struct Encoder {
    charset: Charset,
    bom_pending: bool,
}

impl Encoder {
    pub fn new(charset: Charset) -> Self {
        Self { charset, bom_pending: charset == Charset::Utf16 }
    }

    /// Append the encoded form of `text` to `out`.
    pub fn encode(&mut self, text: &str, out: &mut Vec<u8>) {
        if text.is_empty() {
            return;
        }
        match self.charset {
            Charset::Utf8 => out.extend_from_slice(text.as_bytes()),
            Charset::Utf16 => {
                if self.bom_pending {
                    out.extend_from_slice(&UTF16_BOM_BE);
                    self.bom_pending = false;
                }
                encode_utf16(text, Endian::Big, out);
            }
            Charset::Utf16Be => encode_utf16(text, Endian::Big, out),
            Charset::Utf16Le => encode_utf16(text, Endian::Little, out),
            Charset::Ascii => out.extend(text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' })),
            Charset::Iso8859_1 => out.extend(text.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))),
        }
    }
}

fn encode_utf16(text: &str, endian: Endian, out: &mut Vec<u8>) {
    out.reserve(text.len() * 2);
    for unit in text.encode_utf16() {
        match endian {
            Endian::Big => out.extend_from_slice(&unit.to_be_bytes()),
            Endian::Little => out.extend_from_slice(&unit.to_le_bytes()),
        }
    }
}

/// Streaming decoder. Incomplete sequences at the end of a chunk are held
/// until the next call to `decode` or until `finish`.
#[derive(Debug, Clone)]
pub struct Decoder {
    charset: Charset,
    pending: Vec<u8>,
    endian: Option<Endian>,
}

impl Decoder {
    pub fn new(charset: Charset) -> Self {
        let endian = match charset {
            Charset::Utf16Be => Some(Endian::Big),
            Charset::Utf16Le => Some(Endian::Little),
            _ => None,
        };
        Self { charset, pending: Vec::new(), endian }
    }

    /// Decode `input`, appending complete characters to `out`.
    pub fn decode(&mut self, input: &[u8], out: &mut String) {
        match self.charset {
            Charset::Utf8 => self.decode_utf8(input, out),
            Charset::Utf16 | Charset::Utf16Be | Charset::Utf16Le => self.decode_utf16(input, out),
            Charset::Ascii => out.extend(input.iter().map(|b| if b.is_ascii() { *b as char } else { REPLACEMENT_CHARACTER })),
            Charset::Iso8859_1 => out.extend(input.iter().map(|b| *b as char)),
        }
    }

    /// Flush held bytes at end of input; a dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push(REPLACEMENT_CHARACTER);
            self.pending.clear();
        }
    }

    fn joined<'a>(&mut self, input: &'a [u8], scratch: &'a mut Vec<u8>) -> &'a [u8] {
        if self.pending.is_empty() {
            input
        } else {
            *scratch = std::mem::take(&mut self.pending);
            scratch.extend_from_slice(input);
            scratch
        }
    }

    fn decode_utf8(&mut self, input: &[u8], out: &mut String) {
        let mut scratch = Vec::new();
        let mut rest = self.joined(input, &mut scratch);
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&rest[..valid]) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            rest = &rest[valid + len..];
                        }
                        None => {
                            self.pending = rest[valid..].to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn decode_utf16(&mut self, input: &[u8], out: &mut String) {
        let mut scratch = Vec::new();
        let mut bytes = self.joined(input, &mut scratch);

        if self.endian.is_none() {
            if bytes.len() < 2 {
                self.pending = bytes.to_vec();
                return;
            }
            if bytes[..2] == UTF16_BOM_BE {
                self.endian = Some(Endian::Big);
                bytes = &bytes[2..];
            } else if bytes[..2] == UTF16_BOM_LE {
                self.endian = Some(Endian::Little);
                bytes = &bytes[2..];
            } else {
                self.endian = Some(Endian::Big);
            }
        }
        let endian = self.endian.unwrap_or(Endian::Big);

        let mut units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| match endian {
                Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
                Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
            })
            .collect();
        let mut carry = bytes[units.len() * 2..].to_vec();

        // A high surrogate at the end waits for its partner.
        if let Some(&last) = units.last() {
            if (0xD800..0xDC00).contains(&last) {
                units.pop();
                let start = units.len() * 2;
                carry = bytes[start..].to_vec();
            }
        }

        out.extend(char::decode_utf16(units).map(|r| r.unwrap_or(REPLACEMENT_CHARACTER)));
        self.pending = carry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_sequence_split_across_chunks() {
        let bytes = "héllo €".as_bytes();
        let mut decoder = Charset::Utf8.decoder();
        let mut out = String::new();
        for b in bytes {
            decoder.decode(std::slice::from_ref(b), &mut out);
        }
        decoder.finish(&mut out);
        assert_eq!(out, "héllo €");
    }

    #[test]
    fn utf16_bom_selects_endianness() {
        let mut le = vec![0xFF, 0xFE];
        le.extend_from_slice(&Charset::Utf16Le.encode("ab"));
        assert_eq!(Charset::Utf16.decode(&le), "ab");

        let be = Charset::Utf16.encode("ab");
        assert_eq!(&be[..2], &UTF16_BOM_BE);
        assert_eq!(Charset::Utf16.decode(&be), "ab");
    }

    #[test]
    fn utf16_surrogate_pair_split() {
        let bytes = Charset::Utf16Be.encode("x😀y");
        let mut decoder = Charset::Utf16Be.decoder();
        let mut out = String::new();
        for chunk in bytes.chunks(3) {
            decoder.decode(chunk, &mut out);
        }
        decoder.finish(&mut out);
        assert_eq!(out, "x😀y");
    }

    #[test]
    fn dangling_bytes_become_replacement() {
        assert_eq!(Charset::Utf8.decode(&[b'a', 0xE2, 0x82]), "a\u{FFFD}");
        assert_eq!(Charset::Utf16Le.decode(&[b'a', 0, b'b']), "a\u{FFFD}");
    }
}
