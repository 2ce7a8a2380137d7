//! Map keys as their canonical encoded bytes.
//!
//! A key *is* its encoding: equality, ordering and hashing are defined on the
//! byte buffer alone, which both makes map lookup exact (no "1" vs "1.0"
//! confusion) and gives the canonical bytewise-lexical map sort for free when
//! keys are stored in an ordered map.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::cbor::{self, CborType, MAJOR_BYTES, MAJOR_NEGATIVE, MAJOR_TEXT, MAJOR_UNSIGNED};
use crate::error::PatchError;

/// The array-append sentinel: the text string `-`.
const MINUS: [u8; 2] = [0x61, 0x2d];

/// A map key in its canonical CBOR encoding.
///
/// Only positive/negative integers, byte strings and text strings are valid
/// key types; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedKey(Vec<u8>);

impl EncodedKey {
    /// Wraps already-encoded bytes, validating type and well-formedness.
    pub fn from_bytes(data: &[u8]) -> Result<EncodedKey, PatchError> {
        let ty = CborType::read(data);
        if !ty.valid_key() {
            return Err(PatchError::InvalidKey(format!("{ty} can not be used as map key")));
        }
        if cbor::item_size(data)? != data.len() {
            return Err(PatchError::InvalidKey(format!(
                "h'{}' is not a single well-formed item",
                cbor::hex(data)
            )));
        }
        Ok(EncodedKey(data.to_vec()))
    }

    /// Encodes an integer key.
    pub fn from_int(i: i64) -> EncodedKey {
        let mut out = Vec::with_capacity(9);
        if i >= 0 {
            cbor::write_head(&mut out, MAJOR_UNSIGNED, i as u64);
        } else {
            cbor::write_head(&mut out, MAJOR_NEGATIVE, !(i as u64));
        }
        EncodedKey(out)
    }

    /// Encodes a text-string key.
    pub fn from_text(s: &str) -> EncodedKey {
        let mut out = Vec::with_capacity(s.len() + 2);
        cbor::write_head(&mut out, MAJOR_TEXT, s.len() as u64);
        out.extend_from_slice(s.as_bytes());
        EncodedKey(out)
    }

    /// Encodes a byte-string key.
    pub fn from_bin(data: &[u8]) -> EncodedKey {
        let mut out = Vec::with_capacity(data.len() + 2);
        cbor::write_head(&mut out, MAJOR_BYTES, data.len() as u64);
        out.extend_from_slice(data);
        EncodedKey(out)
    }

    /// The array-append sentinel `-`.
    pub fn minus() -> EncodedKey {
        EncodedKey(MINUS.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn cbor_type(&self) -> CborType {
        CborType::read(&self.0)
    }

    pub fn is_minus(&self) -> bool {
        self.0 == MINUS
    }

    /// True for keys usable as array positions: integers and `-`.
    pub fn is_index(&self) -> bool {
        self.is_minus()
            || matches!(
                self.cbor_type(),
                CborType::PositiveInt | CborType::NegativeInt
            )
    }

    /// Decodes the key as an integer. `-` maps to the sentinel `-1`; values
    /// outside the native signed range fail with `InvalidIndex`, non-integer
    /// keys with `InvalidKey`.
    pub fn to_int(&self) -> Result<i64, PatchError> {
        if self.is_minus() {
            return Ok(-1);
        }
        let (major, arg, _) = cbor::read_head(&self.0)?;
        match major {
            MAJOR_UNSIGNED => {
                i64::try_from(arg).map_err(|_| PatchError::InvalidIndex(format!("{arg} overflows")))
            }
            MAJOR_NEGATIVE => {
                if arg > i64::MAX as u64 {
                    Err(PatchError::InvalidIndex(format!("-{} overflows", arg as u128 + 1)))
                } else {
                    Ok(-1 - arg as i64)
                }
            }
            _ => Err(PatchError::InvalidKey(format!(
                "{} was not a proper array index",
                self
            ))),
        }
    }

    /// Rendering for JSON object key positions: text unquoted, integers
    /// decimal, byte strings base64url without padding.
    pub fn to_map_key_string(&self) -> String {
        let ty = self.cbor_type();
        if !matches!(ty, CborType::TextString | CborType::ByteString) {
            return self.to_string();
        }
        match cbor::read_head(&self.0) {
            Ok((_, len, head)) => {
                let payload = &self.0[head..head + len as usize];
                if ty == CborType::TextString {
                    String::from_utf8_lossy(payload).into_owned()
                } else {
                    URL_SAFE_NO_PAD.encode(payload)
                }
            }
            Err(_) => self.to_string(),
        }
    }
}

impl fmt::Display for EncodedKey {
    /// Diagnostic notation: integers decimal, text strings quoted, byte
    /// strings `h'..'`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cbor::diagnostic(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_are_canonical() {
        assert_eq!(EncodedKey::from_int(0).as_bytes(), [0x00]);
        assert_eq!(EncodedKey::from_int(23).as_bytes(), [0x17]);
        assert_eq!(EncodedKey::from_int(24).as_bytes(), [0x18, 0x18]);
        assert_eq!(EncodedKey::from_int(-1).as_bytes(), [0x20]);
        assert_eq!(EncodedKey::from_int(-256).as_bytes(), [0x38, 0xff]);
        assert_eq!(EncodedKey::from_text("a").as_bytes(), [0x61, 0x61]);
        assert_eq!(EncodedKey::from_bin(&[0xde]).as_bytes(), [0x41, 0xde]);
        assert_eq!(EncodedKey::from_text("-"), EncodedKey::minus());
    }

    #[test]
    fn from_bytes_validates_type() {
        assert!(EncodedKey::from_bytes(&[0x01]).is_ok());
        assert!(EncodedKey::from_bytes(&[0x61, 0x61]).is_ok());
        // arrays, maps, floats and null are not keys
        assert!(matches!(
            EncodedKey::from_bytes(&[0x80]),
            Err(PatchError::InvalidKey(_))
        ));
        assert!(matches!(
            EncodedKey::from_bytes(&[0xa0]),
            Err(PatchError::InvalidKey(_))
        ));
        assert!(matches!(
            EncodedKey::from_bytes(&[0xf6]),
            Err(PatchError::InvalidKey(_))
        ));
        // truncated text string
        assert!(EncodedKey::from_bytes(&[0x62, 0x61]).is_err());
        // trailing bytes after a complete item
        assert!(EncodedKey::from_bytes(&[0x01, 0x01]).is_err());
    }

    #[test]
    fn index_classification() {
        assert!(EncodedKey::from_int(3).is_index());
        assert!(EncodedKey::from_int(-2).is_index());
        assert!(EncodedKey::minus().is_index());
        assert!(!EncodedKey::from_text("3").is_index());
        assert!(!EncodedKey::from_bin(&[0x03]).is_index());
    }

    #[test]
    fn to_int_values() {
        assert_eq!(EncodedKey::from_int(7).to_int().unwrap(), 7);
        assert_eq!(EncodedKey::from_int(-3).to_int().unwrap(), -3);
        assert_eq!(EncodedKey::minus().to_int().unwrap(), -1);
        assert!(matches!(
            EncodedKey::from_text("x").to_int(),
            Err(PatchError::InvalidKey(_))
        ));
        // u64 beyond i64::MAX overflows the native signed range
        let big = EncodedKey::from_bytes(&[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
            .unwrap();
        assert!(matches!(big.to_int(), Err(PatchError::InvalidIndex(_))));
    }

    #[test]
    fn ordering_is_bytewise_on_encodings() {
        // shorter encodings sort first within a major type
        assert!(EncodedKey::from_text("z") < EncodedKey::from_text("aa"));
        assert!(EncodedKey::from_int(9) < EncodedKey::from_int(-1));
    }

    #[test]
    fn display_forms() {
        assert_eq!(EncodedKey::from_int(5).to_string(), "5");
        assert_eq!(EncodedKey::from_text("foo").to_string(), "\"foo\"");
        assert_eq!(EncodedKey::from_bin(&[0xde, 0xad]).to_string(), "h'dead'");
        assert_eq!(EncodedKey::from_text("foo").to_map_key_string(), "foo");
        assert_eq!(EncodedKey::from_int(5).to_map_key_string(), "5");
        assert_eq!(
            EncodedKey::from_bin(&[0xde, 0xad]).to_map_key_string(),
            "3q0"
        );
    }
}
