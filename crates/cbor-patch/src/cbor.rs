//! Byte-level CBOR helpers shared by the lazy node layer.
//!
//! The engine never decodes more structure than it needs: this module knows
//! how to classify an encoded item by its first byte, measure the extent of a
//! single item (so containers can be split one level deep without decoding
//! children), and write canonical heads back out. Whole-value decoding, where
//! required (diagnostics, JSON conversion of scalars), goes through ciborium.

use std::fmt;
use std::io::Cursor;

use ciborium::value::Value as CborValue;

use crate::error::PatchError;

pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;

/// CBOR null, the canonical raw form of an absent or empty value.
pub const RAW_NULL: &[u8] = &[0xf6];
/// CBOR undefined; treated as null by the engine.
pub const RAW_UNDEFINED: &[u8] = &[0xf7];
/// An empty CBOR array.
pub const RAW_EMPTY_ARRAY: &[u8] = &[0x80];
/// An empty CBOR map.
pub const RAW_EMPTY_MAP: &[u8] = &[0xa0];

/// Decode nesting cap for the single-item scanner.
const MAX_DEPTH: usize = 128;

/// The major type of a raw encoded CBOR value, read from its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CborType {
    PositiveInt,
    NegativeInt,
    ByteString,
    TextString,
    Array,
    Map,
    Tag,
    Primitives,
    /// Empty input.
    Invalid,
}

impl CborType {
    /// Classifies raw bytes by `first_byte & 0xE0`.
    pub fn read(data: &[u8]) -> CborType {
        match data.first() {
            None => CborType::Invalid,
            Some(b) => match b & 0xe0 {
                0x00 => CborType::PositiveInt,
                0x20 => CborType::NegativeInt,
                0x40 => CborType::ByteString,
                0x60 => CborType::TextString,
                0x80 => CborType::Array,
                0xa0 => CborType::Map,
                0xc0 => CborType::Tag,
                _ => CborType::Primitives,
            },
        }
    }

    /// Returns true for the major types permitted as map keys.
    pub fn valid_key(self) -> bool {
        matches!(
            self,
            CborType::PositiveInt
                | CborType::NegativeInt
                | CborType::ByteString
                | CborType::TextString
        )
    }
}

impl fmt::Display for CborType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CborType::PositiveInt => "positive integer",
            CborType::NegativeInt => "negative integer",
            CborType::ByteString => "byte string",
            CborType::TextString => "UTF-8 text string",
            CborType::Array => "array",
            CborType::Map => "map",
            CborType::Tag => "tag",
            CborType::Primitives => "primitives",
            CborType::Invalid => "invalid type",
        };
        f.write_str(name)
    }
}

/// Reads an item head: `(major, argument, bytes consumed)`.
///
/// Indefinite-length heads (additional info 31) and the reserved values 28-30
/// are rejected. For major type 7 the argument carries the raw payload bits
/// (simple value or float).
pub(crate) fn read_head(data: &[u8]) -> Result<(u8, u64, usize), PatchError> {
    let first = *data.first().ok_or(PatchError::InvalidNode)?;
    let major = first >> 5;
    let info = first & 0x1f;
    let take = |n: usize| -> Result<u64, PatchError> {
        if data.len() < 1 + n {
            return Err(PatchError::InvalidNode);
        }
        let mut arg = 0u64;
        for &b in &data[1..1 + n] {
            arg = arg << 8 | u64::from(b);
        }
        Ok(arg)
    };
    match info {
        0..=23 => Ok((major, u64::from(info), 1)),
        24 => Ok((major, take(1)?, 2)),
        25 => Ok((major, take(2)?, 3)),
        26 => Ok((major, take(4)?, 5)),
        27 => Ok((major, take(8)?, 9)),
        _ => Err(PatchError::InvalidNode),
    }
}

/// Returns the total byte length of the single item at the start of `data`.
///
/// Fails on truncated, malformed or indefinite-length input, so every slice
/// it carves out is a well-formed definite-length item.
pub(crate) fn item_size(data: &[u8]) -> Result<usize, PatchError> {
    item_end(data, 0, 0)
}

fn item_end(data: &[u8], offset: usize, depth: usize) -> Result<usize, PatchError> {
    if depth > MAX_DEPTH {
        return Err(PatchError::InvalidNode);
    }
    let (major, arg, head) = read_head(&data[offset.min(data.len())..])?;
    let after_head = offset
        .checked_add(head)
        .ok_or(PatchError::InvalidNode)?;
    let checked = |end: u64| -> Result<usize, PatchError> {
        let end = usize::try_from(end)
            .ok()
            .and_then(|n| after_head.checked_add(n))
            .ok_or(PatchError::InvalidNode)?;
        if end > data.len() {
            return Err(PatchError::InvalidNode);
        }
        Ok(end)
    };
    match major {
        MAJOR_UNSIGNED | MAJOR_NEGATIVE | 7 => Ok(after_head),
        MAJOR_BYTES | MAJOR_TEXT => checked(arg),
        MAJOR_ARRAY | MAJOR_MAP => {
            let items = if major == MAJOR_MAP {
                arg.checked_mul(2).ok_or(PatchError::InvalidNode)?
            } else {
                arg
            };
            let mut end = after_head;
            for _ in 0..items {
                end = item_end(data, end, depth + 1)?;
            }
            Ok(end)
        }
        MAJOR_TAG => item_end(data, after_head, depth + 1),
        _ => Err(PatchError::InvalidNode),
    }
}

/// Writes a canonical (shortest-form) head for `major` with argument `arg`.
pub(crate) fn write_head(out: &mut Vec<u8>, major: u8, arg: u64) {
    let major_bits = major << 5;
    if arg <= 23 {
        out.push(major_bits | arg as u8);
    } else if arg <= 0xff {
        out.push(major_bits | 24);
        out.push(arg as u8);
    } else if arg <= 0xffff {
        out.push(major_bits | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= 0xffff_ffff {
        out.push(major_bits | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        out.push(major_bits | 27);
        out.extend_from_slice(&arg.to_be_bytes());
    }
}

/// Renders raw CBOR as diagnostic notation.
///
/// Bytes that do not decode render as a base16 byte string (`h'..'`) of the
/// whole input instead of failing.
pub fn diagnostic(data: &[u8]) -> String {
    let mut cursor = Cursor::new(data);
    match ciborium::de::from_reader::<CborValue, _>(&mut cursor) {
        Ok(value) => {
            let mut out = String::new();
            write_diag(&mut out, &value);
            out
        }
        Err(_) => format!("h'{}'", hex(data)),
    }
}

fn write_diag(out: &mut String, value: &CborValue) {
    match value {
        CborValue::Integer(i) => out.push_str(&i128::from(*i).to_string()),
        CborValue::Bytes(b) => {
            out.push_str("h'");
            out.push_str(&hex(b));
            out.push('\'');
        }
        CborValue::Float(f) => out.push_str(&format!("{f:?}")),
        CborValue::Text(s) => {
            out.push_str(&serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}")))
        }
        CborValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        CborValue::Null => out.push_str("null"),
        CborValue::Tag(tag, inner) => {
            out.push_str(&tag.to_string());
            out.push('(');
            write_diag(out, inner);
            out.push(')');
        }
        CborValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_diag(out, item);
            }
            out.push(']');
        }
        CborValue::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_diag(out, k);
                out.push_str(": ");
                write_diag(out, v);
            }
            out.push('}');
        }
        _ => out.push_str("undefined"),
    }
}

pub(crate) fn hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
