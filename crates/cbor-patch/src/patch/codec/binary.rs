//! The CBOR surface for patches: an array of integer-keyed operation maps
//! (`1` = op code, `2` = from, `3` = path, `4` = value), with paths as arrays
//! of encoded keys and values as raw CBOR.
//!
//! Decoding rides the engine's own lazy layer, so raw value bytes pass
//! through untouched and the decoder contract (no indefinite lengths, no
//! duplicate keys) applies to patch documents as well.

use crate::cbor::{self, MAJOR_ARRAY, MAJOR_MAP, MAJOR_UNSIGNED};
use crate::container::ContainerMut;
use crate::error::PatchError;
use crate::key::EncodedKey;
use crate::node::Node;
use crate::patch::types::{OpCode, Operation, Patch};
use crate::path::Path;

impl Patch {
    /// Decodes an encoded patch document.
    pub fn from_cbor(data: &[u8]) -> Result<Patch, PatchError> {
        let mut node = Node::new(data);
        let ContainerMut::Array(items) = node.into_container()? else {
            return Err(PatchError::InvalidOperation(
                "patch must be an array of operations".to_string(),
            ));
        };
        let mut ops = Vec::with_capacity(items.len());
        for item in items.iter_mut() {
            ops.push(operation_from_node(item)?);
        }
        Ok(Patch(ops))
    }

    /// Encodes the patch canonically.
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut out = Vec::new();
        cbor::write_head(&mut out, MAJOR_ARRAY, self.len() as u64);
        for op in self {
            let mut fields = 2u64;
            if op.from.is_some() {
                fields += 1;
            }
            if op.value.is_some() {
                fields += 1;
            }
            cbor::write_head(&mut out, MAJOR_MAP, fields);
            cbor::write_head(&mut out, MAJOR_UNSIGNED, 1);
            cbor::write_head(&mut out, MAJOR_UNSIGNED, op.op as u64);
            if let Some(from) = &op.from {
                cbor::write_head(&mut out, MAJOR_UNSIGNED, 2);
                write_path(&mut out, from);
            }
            cbor::write_head(&mut out, MAJOR_UNSIGNED, 3);
            write_path(&mut out, &op.path);
            if let Some(value) = &op.value {
                cbor::write_head(&mut out, MAJOR_UNSIGNED, 4);
                out.extend_from_slice(value);
            }
        }
        out
    }
}

fn write_path(out: &mut Vec<u8>, path: &Path) {
    cbor::write_head(out, MAJOR_ARRAY, path.len() as u64);
    for key in path {
        out.extend_from_slice(key.as_bytes());
    }
}

fn operation_from_node(node: &mut Node) -> Result<Operation, PatchError> {
    let ContainerMut::Map(entries) = node.into_container()? else {
        return Err(PatchError::InvalidOperation(
            "operation must be an integer-keyed map".to_string(),
        ));
    };
    let mut code = None;
    let mut from = None;
    let mut path = None;
    let mut value = None;
    for (key, field) in entries.iter_mut() {
        match key.to_int() {
            Ok(1) => code = Some(op_code_from_node(field)?),
            Ok(3) => path = Some(path_from_node(field)?),
            Ok(2) => from = Some(path_from_node(field)?),
            Ok(4) => value = Some(field.marshal()),
            _ => {
                return Err(PatchError::InvalidOperation(format!(
                    "unexpected operation field {key}"
                )))
            }
        }
    }
    let operation = Operation {
        op: code.ok_or_else(|| PatchError::InvalidOperation("missing op code".to_string()))?,
        from,
        path: path.ok_or_else(|| PatchError::InvalidOperation("missing path".to_string()))?,
        value,
    };
    operation.validate()?;
    Ok(operation)
}

fn op_code_from_node(node: &Node) -> Result<OpCode, PatchError> {
    let bytes = node.marshal();
    match cbor::read_head(&bytes)? {
        (MAJOR_UNSIGNED, code, _) => OpCode::from_code(code),
        _ => Err(PatchError::InvalidOperation(
            "op code must be an unsigned integer".to_string(),
        )),
    }
}

fn path_from_node(node: &mut Node) -> Result<Path, PatchError> {
    let ContainerMut::Array(items) = node.into_container()? else {
        return Err(PatchError::InvalidPath(
            "path must be an array of keys".to_string(),
        ));
    };
    let mut keys = Vec::with_capacity(items.len());
    for item in items.iter() {
        keys.push(EncodedKey::from_bytes(&item.marshal())?);
    }
    Ok(Path::from_keys(keys))
}
