//! Document conversion between JSON text and canonically encoded CBOR.
//!
//! JSON is the human surface: tests, examples and the JSON patch codec all
//! build documents through these converters. The CBOR side is always the
//! canonical form (map entries sorted by encoded key bytes, shortest heads).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ciborium::value::Value as CborValue;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::io::Cursor;

use crate::cbor::{self, MAJOR_ARRAY, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TEXT, MAJOR_UNSIGNED};
use crate::error::PatchError;
use crate::key::EncodedKey;
use crate::node::Node;

/// Converts a JSON document to canonical CBOR bytes.
pub fn from_json(doc: &str) -> Result<Vec<u8>, PatchError> {
    let value: JsonValue =
        serde_json::from_str(doc).map_err(|_| PatchError::InvalidNode)?;
    Ok(value_to_cbor(&value))
}

/// Converts an encoded CBOR document to JSON text.
///
/// Non-text map keys render with their JSON-object-key display (integers
/// decimal, byte strings base64url without padding); byte-string values
/// render as base64url strings.
pub fn to_json(doc: &[u8]) -> Result<String, PatchError> {
    let value = bytes_to_value(doc)?;
    serde_json::to_string(&value).map_err(|_| PatchError::UnknownType)
}

/// Encodes a `serde_json::Value` as canonical CBOR.
pub(crate) fn value_to_cbor(value: &JsonValue) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut Vec<u8>, value: &JsonValue) {
    match value {
        JsonValue::Null => out.push(0xf6),
        JsonValue::Bool(b) => out.push(if *b { 0xf5 } else { 0xf4 }),
        JsonValue::Number(n) => write_number(out, n),
        JsonValue::String(s) => {
            cbor::write_head(out, MAJOR_TEXT, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        JsonValue::Array(items) => {
            cbor::write_head(out, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                write_value(out, item);
            }
        }
        JsonValue::Object(entries) => {
            let mut encoded: Vec<(EncodedKey, &JsonValue)> = entries
                .iter()
                .map(|(k, v)| (EncodedKey::from_text(k), v))
                .collect();
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            cbor::write_head(out, MAJOR_MAP, encoded.len() as u64);
            for (key, v) in encoded {
                out.extend_from_slice(key.as_bytes());
                write_value(out, v);
            }
        }
    }
}

/// Integer ladder: unsigned 64-bit, then signed 64-bit, then integral doubles
/// within CBOR's native integer range; everything else is a float (binary32
/// when it round-trips).
fn write_number(out: &mut Vec<u8>, n: &Number) {
    if let Some(u) = n.as_u64() {
        cbor::write_head(out, MAJOR_UNSIGNED, u);
        return;
    }
    if let Some(i) = n.as_i64() {
        cbor::write_head(out, MAJOR_NEGATIVE, !(i as u64));
        return;
    }
    let f = n.as_f64().unwrap_or(0.0);
    if f.is_finite() && f.fract() == 0.0 {
        let i = f as i128;
        if (0..=u64::MAX as i128).contains(&i) {
            cbor::write_head(out, MAJOR_UNSIGNED, i as u64);
            return;
        }
        if (-(u64::MAX as i128) - 1..0).contains(&i) {
            cbor::write_head(out, MAJOR_NEGATIVE, (-1 - i) as u64);
            return;
        }
    }
    if (f as f32) as f64 == f {
        out.push(0xfa);
        out.extend_from_slice(&(f as f32).to_bits().to_be_bytes());
    } else {
        out.push(0xfb);
        out.extend_from_slice(&f.to_bits().to_be_bytes());
    }
}

/// Decodes an encoded document into a `serde_json::Value`, walking the lazy
/// layer so the decoder contract (duplicate keys, indefinite lengths) holds
/// for conversions too.
pub(crate) fn bytes_to_value(doc: &[u8]) -> Result<JsonValue, PatchError> {
    if !doc.is_empty() && cbor::item_size(doc)? != doc.len() {
        return Err(PatchError::InvalidNode);
    }
    let mut node = Node::new(doc);
    node_to_value(&mut node)
}

pub(crate) fn node_to_value(node: &mut Node) -> Result<JsonValue, PatchError> {
    use crate::container::ContainerMut;

    if !node.is_container_kind() {
        return scalar_to_value(&node.marshal());
    }
    match node.into_container()? {
        ContainerMut::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter_mut() {
                out.push(node_to_value(item)?);
            }
            Ok(JsonValue::Array(out))
        }
        ContainerMut::Map(entries) => {
            let mut out = JsonMap::new();
            for (key, value) in entries.iter_mut() {
                out.insert(key.to_map_key_string(), node_to_value(value)?);
            }
            Ok(JsonValue::Object(out))
        }
    }
}

fn scalar_to_value(data: &[u8]) -> Result<JsonValue, PatchError> {
    let mut cursor = Cursor::new(data);
    let value = ciborium::de::from_reader::<CborValue, _>(&mut cursor)
        .map_err(|_| PatchError::InvalidNode)?;
    cbor_value_to_json(value)
}

fn cbor_value_to_json(value: CborValue) -> Result<JsonValue, PatchError> {
    Ok(match value {
        CborValue::Null => JsonValue::Null,
        CborValue::Bool(b) => JsonValue::Bool(b),
        CborValue::Integer(i) => {
            let signed = i128::from(i);
            if let Ok(u) = u64::try_from(signed) {
                JsonValue::Number(Number::from(u))
            } else if let Ok(s) = i64::try_from(signed) {
                JsonValue::Number(Number::from(s))
            } else {
                return Err(PatchError::UnknownType);
            }
        }
        CborValue::Float(f) => Number::from_f64(f)
            .map(JsonValue::Number)
            .ok_or(PatchError::UnknownType)?,
        CborValue::Text(s) => JsonValue::String(s),
        CborValue::Bytes(b) => JsonValue::String(URL_SAFE_NO_PAD.encode(b)),
        CborValue::Tag(tag, inner) => match (tag, *inner) {
            (2, CborValue::Bytes(b)) => big_uint_to_json(&b, false)?,
            (3, CborValue::Bytes(b)) => big_uint_to_json(&b, true)?,
            (_, inner) => cbor_value_to_json(inner)?,
        },
        CborValue::Array(items) => JsonValue::Array(
            items
                .into_iter()
                .map(cbor_value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        CborValue::Map(entries) => {
            let mut out = JsonMap::new();
            for (k, v) in entries {
                let key = match k {
                    CborValue::Text(s) => s,
                    CborValue::Integer(i) => i128::from(i).to_string(),
                    CborValue::Bytes(b) => URL_SAFE_NO_PAD.encode(b),
                    _ => return Err(PatchError::UnknownType),
                };
                out.insert(key, cbor_value_to_json(v)?);
            }
            JsonValue::Object(out)
        }
        _ => return Err(PatchError::UnknownType),
    })
}

/// Bignum content within the 64-bit range converts to a JSON number; larger
/// magnitudes have no lossless JSON form here.
fn big_uint_to_json(bytes: &[u8], negative: bool) -> Result<JsonValue, PatchError> {
    let mut magnitude: u128 = 0;
    for &b in bytes {
        magnitude = magnitude.checked_mul(256).ok_or(PatchError::UnknownType)? + u128::from(b);
    }
    if negative {
        let signed = -1i128 - i128::try_from(magnitude).map_err(|_| PatchError::UnknownType)?;
        let n = i64::try_from(signed).map_err(|_| PatchError::UnknownType)?;
        Ok(JsonValue::Number(Number::from(n)))
    } else {
        let n = u64::try_from(magnitude).map_err(|_| PatchError::UnknownType)?;
        Ok(JsonValue::Number(Number::from(n)))
    }
}
