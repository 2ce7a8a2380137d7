//! Paths: ordered sequences of encoded keys.
//!
//! Two surfaces build the same value: the native one (a list of already
//! encoded keys) and JSON Pointer, where every token that looks like an
//! integer becomes an integer key and everything else a text-string key.

use std::fmt;
use std::slice;

use cbor_patch_json_pointer as pointer;

use crate::error::PatchError;
use crate::key::EncodedKey;

/// A location in a document. The empty path denotes the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<EncodedKey>);

impl Path {
    /// The empty path (the document root).
    pub fn root() -> Path {
        Path(Vec::new())
    }

    pub fn from_keys(keys: Vec<EncodedKey>) -> Path {
        Path(keys)
    }

    /// Parses a JSON Pointer.
    ///
    /// Tokens matching `-?[0-9]+` become integer keys (falling back to text
    /// keys when they overflow `i64`); `-` stays the text append sentinel;
    /// everything else becomes a text-string key.
    pub fn from_pointer(s: &str) -> Result<Path, PatchError> {
        let tokens = pointer::parse_pointer(s)
            .map_err(|e| PatchError::InvalidPath(e.to_string()))?;
        let mut keys = Vec::with_capacity(tokens.len());
        for token in &tokens {
            if pointer::is_integer_token(token) {
                if let Ok(i) = token.parse::<i64>() {
                    keys.push(EncodedKey::from_int(i));
                    continue;
                }
            }
            keys.push(EncodedKey::from_text(token));
        }
        Ok(Path(keys))
    }

    /// Renders the path as a JSON Pointer.
    ///
    /// Only text-string and integer keys are addressable on this surface;
    /// byte-string keys fail with `InvalidPath`.
    pub fn to_pointer(&self) -> Result<String, PatchError> {
        let mut tokens = Vec::with_capacity(self.0.len());
        for key in &self.0 {
            if key.is_index() && !key.is_minus() {
                tokens.push(key.to_int()?.to_string());
            } else if key.cbor_type() == crate::cbor::CborType::TextString {
                tokens.push(key.to_map_key_string());
            } else {
                return Err(PatchError::InvalidPath(format!(
                    "key {key} has no JSON Pointer form"
                )));
            }
        }
        Ok(pointer::format_pointer(&tokens))
    }

    /// Returns a new path with `key` appended.
    pub fn with_key(&self, key: EncodedKey) -> Path {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend_from_slice(&self.0);
        keys.push(key);
        Path(keys)
    }

    /// Returns a new path with an integer key appended.
    pub fn with_index(&self, i: i64) -> Path {
        self.with_key(EncodedKey::from_int(i))
    }

    pub fn push(&mut self, key: EncodedKey) {
        self.0.push(key);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[EncodedKey] {
        &self.0
    }

    pub fn iter(&self) -> slice::Iter<'_, EncodedKey> {
        self.0.iter()
    }

    /// Splits into the intermediate segments and the final key; `None` for
    /// the empty path.
    pub fn split_last(&self) -> Option<(&[EncodedKey], &EncodedKey)> {
        self.0.split_last().map(|(last, init)| (init, last))
    }
}

impl fmt::Display for Path {
    /// A JSON array of the per-key diagnostic strings, e.g. `["foo", 1]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("]")
    }
}

impl FromIterator<EncodedKey> for Path {
    fn from_iter<T: IntoIterator<Item = EncodedKey>>(iter: T) -> Path {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a EncodedKey;
    type IntoIter = slice::Iter<'a, EncodedKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_parsing() {
        assert!(Path::from_pointer("").unwrap().is_empty());
        let p = Path::from_pointer("/foo/0/-/-2").unwrap();
        assert_eq!(
            p.keys(),
            [
                EncodedKey::from_text("foo"),
                EncodedKey::from_int(0),
                EncodedKey::minus(),
                EncodedKey::from_int(-2),
            ]
        );
        assert!(matches!(
            Path::from_pointer("foo"),
            Err(PatchError::InvalidPath(_))
        ));
    }

    #[test]
    fn pointer_escapes_and_trailing_segments() {
        let p = Path::from_pointer("/a~1b/m~0n/").unwrap();
        assert_eq!(
            p.keys(),
            [
                EncodedKey::from_text("a/b"),
                EncodedKey::from_text("m~n"),
                EncodedKey::from_text(""),
            ]
        );
    }

    #[test]
    fn numeric_looking_tokens() {
        // "1.0" has no integer form, "01" does (leading zeros are accepted)
        let p = Path::from_pointer("/1.0/01").unwrap();
        assert_eq!(
            p.keys(),
            [EncodedKey::from_text("1.0"), EncodedKey::from_int(1)]
        );
        // i64 overflow falls back to a text key
        let p = Path::from_pointer("/99999999999999999999").unwrap();
        assert_eq!(p.keys(), [EncodedKey::from_text("99999999999999999999")]);
    }

    #[test]
    fn pointer_roundtrip_for_text_keys() {
        for token in ["foo", "a/b", "m~n", "bar baz"] {
            let pointer = pointer::format_pointer(&[token]);
            let path = Path::from_pointer(&pointer).unwrap();
            assert_eq!(path.len(), 1);
            assert_eq!(path.keys()[0], EncodedKey::from_text(token));
            assert_eq!(path.to_pointer().unwrap(), pointer);
        }
    }

    #[test]
    fn to_pointer_rejects_byte_keys() {
        let path = Path::root().with_key(EncodedKey::from_bin(&[1, 2]));
        assert!(matches!(
            path.to_pointer(),
            Err(PatchError::InvalidPath(_))
        ));
    }

    #[test]
    fn display_is_a_json_array_of_diagnostics() {
        let p = Path::root()
            .with_key(EncodedKey::from_text("foo"))
            .with_index(1);
        assert_eq!(p.to_string(), "[\"foo\", 1]");
        assert_eq!(Path::root().to_string(), "[]");
    }
}
