//! Output character encodings.

use crate::error::{StorageError, StorageResult};
use std::fmt;
use std::str::FromStr;

/// Replacement written for characters the encoding cannot represent.
pub const REPLACEMENT: u8 = b'?';

/// Character encoding of a saved file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8, able to represent every character.
    #[default]
    Utf8,
    /// 7-bit US-ASCII.
    UsAscii,
    /// ISO-8859-1 (Latin-1).
    Iso8859_1,
}

impl Encoding {
    /// Returns the canonical name written into file headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::UsAscii => "US-ASCII",
            Self::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Returns true if `c` can be written in this encoding.
    #[must_use]
    pub const fn can_encode(self, c: char) -> bool {
        match self {
            Self::Utf8 => true,
            Self::UsAscii => (c as u32) < 0x80,
            Self::Iso8859_1 => (c as u32) < 0x100,
        }
    }

    /// Encodes `text`, appending to `out`.
    ///
    /// Characters that cannot be represented are replaced by [`REPLACEMENT`]
    /// and passed to `on_unmappable`.
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>, mut on_unmappable: impl FnMut(char)) {
        if self == Self::Utf8 {
            out.extend_from_slice(text.as_bytes());
            return;
        }

        out.reserve(text.len());
        for c in text.chars() {
            if self.can_encode(c) {
                #[allow(clippy::cast_possible_truncation)]
                out.push(c as u32 as u8);
            } else {
                out.push(REPLACEMENT);
                on_unmappable(c);
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "us-ascii" | "ascii" => Ok(Self::UsAscii),
            "iso-8859-1" | "iso8859-1" | "iso_8859_1" | "latin1" | "latin-1" => {
                Ok(Self::Iso8859_1)
            }
            _ => Err(StorageError::UnsupportedEncoding(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("latin1".parse::<Encoding>().unwrap(), Encoding::Iso8859_1);
        assert_eq!(" ascii ".parse::<Encoding>().unwrap(), Encoding::UsAscii);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }

    #[test]
    fn latin1_replaces_unmappable() {
        let mut out = Vec::new();
        let mut bad = Vec::new();
        Encoding::Iso8859_1.encode_into("Gödel→", &mut out, |c| bad.push(c));
        assert_eq!(out, vec![b'G', 0xf6, b'd', b'e', b'l', b'?']);
        assert_eq!(bad, vec!['→']);
    }

    #[test]
    fn ascii_rejects_umlaut() {
        assert!(!Encoding::UsAscii.can_encode('ü'));
        assert!(Encoding::UsAscii.can_encode('u'));
    }

    proptest::proptest! {
        #[test]
        fn single_byte_encodings_emit_one_byte_per_char(text in "\\PC{0,64}") {
            for encoding in [Encoding::UsAscii, Encoding::Iso8859_1] {
                let mut out = Vec::new();
                let mut replaced = 0usize;
                encoding.encode_into(&text, &mut out, |_| replaced += 1);
                proptest::prop_assert_eq!(out.len(), text.chars().count());
                let unmappable = text.chars().filter(|c| !encoding.can_encode(*c)).count();
                proptest::prop_assert_eq!(replaced, unmappable);
            }
        }
    }

    #[test]
    fn utf8_passes_through() {
        let mut out = Vec::new();
        Encoding::Utf8.encode_into("Łódź", &mut out, |_| panic!("utf-8 encodes everything"));
        assert_eq!(out, "Łódź".as_bytes());
    }
}
