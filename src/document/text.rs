//! PDF string encodings.

use lopdf::{Object, StringFormat};

/// Encode a value as a PDF text string: a literal for ASCII, UTF-16BE with
/// byte order mark otherwise.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&[0xFE, 0xFF]);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string for display.
pub fn decode_text_string(bytes: &[u8]) -> String {
    // UTF-16BE (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text for a simple font with `/WinAnsiEncoding`.
///
/// Characters outside the encoding become `?`; control characters are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_literal() {
        match encode_text_string("Ada Lovelace") {
            Object::String(bytes, StringFormat::Literal) => assert_eq!(bytes, b"Ada Lovelace"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_is_utf16() {
        match encode_text_string("Zoë") {
            Object::String(bytes, _) => {
                assert_eq!(bytes, vec![0xFE, 0xFF, 0x00, b'Z', 0x00, b'o', 0x00, 0xEB]);
                assert_eq!(decode_text_string(&bytes), "Zoë");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_fallbacks() {
        assert_eq!(decode_text_string(b"plain"), "plain");
        assert_eq!(decode_text_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(encode_win_ansi("a: 1"), b"a: 1");
        assert_eq!(encode_win_ansi("é€"), vec![0xE9, 0x80]);
        assert_eq!(encode_win_ansi("日本"), b"??");
        assert_eq!(encode_win_ansi("tab\there"), b"tabhere");
    }
}
