//! The lazily-parsed document tree.
//!
//! A node starts as raw bytes and only splits into a map or array when
//! something walks into it; children stay raw until visited themselves.
//! Serialization of an untouched node is the identity on its bytes, so
//! unmodified branches keep their original encoding.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::cbor::{self, CborType, MAJOR_ARRAY, MAJOR_MAP, RAW_NULL, RAW_UNDEFINED};
use crate::container::{resolve_index, ContainerMut, IndexMode};
use crate::error::PatchError;
use crate::key::EncodedKey;
use crate::patch::types::PatchOptions;

/// Map storage: ordered by encoded key bytes, which is exactly the canonical
/// bytewise-lexical serialization order.
pub(crate) type MapEntries = BTreeMap<EncodedKey, Node>;

#[derive(Debug, Clone)]
enum Repr {
    /// A single well-formed item, structure unknown.
    Raw(Vec<u8>),
    Map(MapEntries),
    Array(Vec<Node>),
    /// Inspected and found to be neither map nor array.
    Other(Vec<u8>),
}

/// A CBOR value with lazy one-level parsing.
#[derive(Debug, Clone)]
pub struct Node {
    repr: Repr,
}

impl Node {
    /// Wraps an encoded document, copying the bytes. Empty input becomes
    /// CBOR null.
    pub fn new(data: &[u8]) -> Node {
        if data.is_empty() {
            return Node::null();
        }
        Node {
            repr: Repr::Raw(data.to_vec()),
        }
    }

    /// The CBOR null node.
    pub fn null() -> Node {
        Node {
            repr: Repr::Raw(RAW_NULL.to_vec()),
        }
    }

    pub(crate) fn from_raw(data: Vec<u8>) -> Node {
        Node {
            repr: Repr::Raw(data),
        }
    }

    /// True for absent content: empty bytes, CBOR null, or CBOR undefined.
    pub fn is_null(&self) -> bool {
        match &self.repr {
            Repr::Raw(b) | Repr::Other(b) => {
                b.is_empty() || b.as_slice() == RAW_NULL || b.as_slice() == RAW_UNDEFINED
            }
            _ => false,
        }
    }

    /// The node's CBOR major type.
    pub fn cbor_type(&self) -> CborType {
        match &self.repr {
            Repr::Raw(b) | Repr::Other(b) => CborType::read(b),
            Repr::Map(_) => CborType::Map,
            Repr::Array(_) => CborType::Array,
        }
    }

    /// True when the node is, or still encodes, a map or array.
    pub(crate) fn is_container_kind(&self) -> bool {
        matches!(self.cbor_type(), CborType::Map | CborType::Array)
    }

    /// Materializes the node one level deep and returns its container.
    ///
    /// A raw node becomes `Map` or `Array` in place (children stay raw); any
    /// other shape is reclassified as `Other` and reported as `InvalidNode`.
    /// Repeat calls return the already-materialized container.
    pub(crate) fn into_container(&mut self) -> Result<ContainerMut<'_>, PatchError> {
        if let Repr::Raw(data) = &self.repr {
            match CborType::read(data) {
                CborType::Map => {
                    let entries = decode_map(data)?;
                    self.repr = Repr::Map(entries);
                }
                CborType::Array => {
                    let items = decode_array(data)?;
                    self.repr = Repr::Array(items);
                }
                _ => {
                    let bytes = data.clone();
                    self.repr = Repr::Other(bytes);
                    return Err(PatchError::InvalidNode);
                }
            }
        }
        match &mut self.repr {
            Repr::Map(m) => Ok(ContainerMut::Map(m)),
            Repr::Array(a) => Ok(ContainerMut::Array(a)),
            Repr::Raw(_) | Repr::Other(_) => Err(PatchError::InvalidNode),
        }
    }

    /// Read-only child lookup, available once this node is materialized.
    pub(crate) fn probe(&self, key: &EncodedKey, options: &PatchOptions) -> Option<&Node> {
        match &self.repr {
            Repr::Map(m) => m.get(key),
            Repr::Array(items) => {
                let idx = resolve_index(key, items.len(), IndexMode::Access, options).ok()?;
                items.get(idx)
            }
            _ => None,
        }
    }

    /// Serializes the node canonically. Raw and scalar nodes re-emit their
    /// original bytes; materialized containers re-encode with map entries in
    /// bytewise-lexical key order.
    pub fn marshal(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        match &self.repr {
            Repr::Raw(b) | Repr::Other(b) => {
                if b.is_empty() {
                    out.extend_from_slice(RAW_NULL);
                } else {
                    out.extend_from_slice(b);
                }
            }
            Repr::Map(entries) => {
                cbor::write_head(out, MAJOR_MAP, entries.len() as u64);
                for (key, value) in entries {
                    out.extend_from_slice(key.as_bytes());
                    value.write_to(out);
                }
            }
            Repr::Array(items) => {
                cbor::write_head(out, MAJOR_ARRAY, items.len() as u64);
                for item in items {
                    item.write_to(out);
                }
            }
        }
    }

    /// Structural equality.
    ///
    /// Nulls equal only nulls; containers compare by shape and recursively by
    /// children (map keys by encoded bytes); everything else compares by raw
    /// bytes, i.e. equality under the configured canonicalization.
    pub fn equal(&self, other: &Node) -> bool {
        if self.is_null() || other.is_null() {
            return self.is_null() && other.is_null();
        }
        match (self.view(), other.view()) {
            (View::Scalar(a), View::Scalar(b)) => a == b,
            (View::Map(a), View::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map_or(false, |ov| v.equal(ov)))
            }
            (View::Array(a), View::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y))
            }
            _ => false,
        }
    }

    /// Borrowed or freshly-decoded one-level structure, for read-only
    /// comparison. Bytes that fail to decode compare as scalars.
    fn view(&self) -> View<'_> {
        match &self.repr {
            Repr::Map(m) => View::Map(Cow::Borrowed(m)),
            Repr::Array(a) => View::Array(Cow::Borrowed(a.as_slice())),
            Repr::Other(b) => View::Scalar(b),
            Repr::Raw(b) => match CborType::read(b) {
                CborType::Map => match decode_map(b) {
                    Ok(m) => View::Map(Cow::Owned(m)),
                    Err(_) => View::Scalar(b),
                },
                CborType::Array => match decode_array(b) {
                    Ok(a) => View::Array(Cow::Owned(a)),
                    Err(_) => View::Scalar(b),
                },
                _ => View::Scalar(b),
            },
        }
    }
}

enum View<'a> {
    Scalar(&'a [u8]),
    Map(Cow<'a, MapEntries>),
    Array(Cow<'a, [Node]>),
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.equal(other)
    }
}

impl fmt::Display for Node {
    /// Diagnostic notation of the serialized node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cbor::diagnostic(&self.marshal()))
    }
}

fn decode_map(data: &[u8]) -> Result<MapEntries, PatchError> {
    let (_, count, head) = cbor::read_head(data)?;
    let mut entries = MapEntries::new();
    let mut offset = head;
    for _ in 0..count {
        let key_len = cbor::item_size(&data[offset..])?;
        let key = EncodedKey::from_bytes(&data[offset..offset + key_len])?;
        offset += key_len;
        let value_len = cbor::item_size(&data[offset..])?;
        let value = Node::from_raw(data[offset..offset + value_len].to_vec());
        offset += value_len;
        if entries.contains_key(&key) {
            return Err(PatchError::DuplicateKey(key.to_string()));
        }
        entries.insert(key, value);
    }
    if offset != data.len() {
        return Err(PatchError::InvalidNode);
    }
    Ok(entries)
}

fn decode_array(data: &[u8]) -> Result<Vec<Node>, PatchError> {
    let (_, count, head) = cbor::read_head(data)?;
    let mut items = Vec::with_capacity(count.min(64) as usize);
    let mut offset = head;
    for _ in 0..count {
        let len = cbor::item_size(&data[offset..])?;
        items.push(Node::from_raw(data[offset..offset + len].to_vec()));
        offset += len;
    }
    if offset != data.len() {
        return Err(PatchError::InvalidNode);
    }
    Ok(items)
}
