//! Path resolution and the operation executor.

use crate::cbor::{self, MAJOR_ARRAY, RAW_EMPTY_MAP};
use crate::container::ContainerMut;
use crate::error::PatchError;
use crate::key::EncodedKey;
use crate::node::Node;
use crate::path::Path;

use super::types::{OpCode, Operation, Patch, PatchOptions};

impl Patch {
    /// Applies the patch to an encoded document with default options and
    /// returns the new document.
    pub fn apply(&self, doc: &[u8]) -> Result<Vec<u8>, PatchError> {
        self.apply_with_options(doc, &PatchOptions::default())
    }

    /// Applies the patch with explicit options.
    pub fn apply_with_options(
        &self,
        doc: &[u8],
        options: &PatchOptions,
    ) -> Result<Vec<u8>, PatchError> {
        let mut node = Node::new(doc);
        node.patch(self, options)?;
        Ok(node.marshal())
    }
}

impl Node {
    /// Applies a patch to this node in place.
    ///
    /// Operations run left to right; the first failure aborts with its error
    /// and the node keeps the effects of the successful prefix.
    pub fn patch(&mut self, patch: &Patch, options: &PatchOptions) -> Result<(), PatchError> {
        self.into_container()?;
        let mut copied_bytes: u64 = 0;
        for op in patch {
            op.validate()?;
            match op.op {
                OpCode::Add => apply_add(self, op, options)?,
                OpCode::Remove => apply_remove(self, op, options)?,
                OpCode::Replace => apply_replace(self, op, options)?,
                OpCode::Move => apply_move(self, op, options)?,
                OpCode::Copy => apply_copy(self, op, &mut copied_bytes, options)?,
                OpCode::Test => apply_test(self, op, options)?,
            }
        }
        Ok(())
    }
}

/// Walks all but the last key from the root and returns the parent container
/// together with the final key. `None` for the empty path, or when any step
/// fails to resolve to a container.
pub(crate) fn find_object<'a>(
    root: &'a mut Node,
    path: &Path,
    options: &PatchOptions,
) -> Option<(ContainerMut<'a>, EncodedKey)> {
    let (parents, last) = path.split_last()?;
    let mut con = root.into_container().ok()?;
    for key in parents {
        let child = con.child(key, options).ok()?;
        con = child.into_container().ok()?;
    }
    Some((con, last.clone()))
}

fn value_node(op: &Operation) -> Node {
    Node::new(op.value.as_deref().unwrap_or_default())
}

fn apply_add(root: &mut Node, op: &Operation, options: &PatchOptions) -> Result<(), PatchError> {
    if options.ensure_path_exists_on_add {
        ensure_path(root, op.path.keys(), options)
            .map_err(|e| e.for_op("add", op.path.to_string()))?;
    }
    let Some((con, key)) = find_object(root, &op.path, options) else {
        return Err(PatchError::Missing.for_op("add", op.path.to_string()));
    };
    con.insert_child(&key, value_node(op), options)
        .map(|_| ())
        .map_err(|e| e.for_op("add", op.path.to_string()))
}

fn apply_remove(root: &mut Node, op: &Operation, options: &PatchOptions) -> Result<(), PatchError> {
    let Some((mut con, key)) = find_object(root, &op.path, options) else {
        if options.allow_missing_path_on_remove {
            return Ok(());
        }
        return Err(PatchError::Missing.for_op("remove", op.path.to_string()));
    };
    con.remove(&key, options)
        .map(|_| ())
        .map_err(|e| e.for_op("remove", op.path.to_string()))
}

fn apply_replace(root: &mut Node, op: &Operation, options: &PatchOptions) -> Result<(), PatchError> {
    if op.path.is_empty() {
        // the new root must itself be a container
        let mut incoming = value_node(op);
        if incoming.into_container().is_err() {
            return Err(PatchError::InvalidOperation(
                "replace operation hit impossible case".to_string(),
            )
            .for_op("replace", op.path.to_string()));
        }
        *root = incoming;
        return Ok(());
    }
    let Some((mut con, key)) = find_object(root, &op.path, options) else {
        return Err(PatchError::Missing.for_op("replace", op.path.to_string()));
    };
    con.get(&key, options)
        .map(|_| ())
        .map_err(|e| e.for_op("replace", op.path.to_string()))?;
    con.set(&key, value_node(op), options)
        .map_err(|e| e.for_op("replace", op.path.to_string()))
}

fn apply_move(root: &mut Node, op: &Operation, options: &PatchOptions) -> Result<(), PatchError> {
    let from = op.from.as_ref().unwrap_or(&op.path);
    let Some((mut con, key)) = find_object(root, from, options) else {
        return Err(PatchError::Missing.for_op("move", from.to_string()));
    };
    let node = con
        .remove(&key, options)
        .map_err(|e| e.for_op("move", from.to_string()))?
        .ok_or_else(|| PatchError::Missing.for_op("move", from.to_string()))?;
    let Some((target, target_key)) = find_object(root, &op.path, options) else {
        return Err(PatchError::Missing.for_op("move", op.path.to_string()));
    };
    target
        .insert_child(&target_key, node, options)
        .map(|_| ())
        .map_err(|e| e.for_op("move", op.path.to_string()))
}

fn apply_copy(
    root: &mut Node,
    op: &Operation,
    copied_bytes: &mut u64,
    options: &PatchOptions,
) -> Result<(), PatchError> {
    let from = op.from.as_ref().unwrap_or(&op.path);
    let Some((mut con, key)) = find_object(root, from, options) else {
        return Err(PatchError::Missing.for_op("copy", from.to_string()));
    };
    // deep copy by re-serialization: breaks all sharing with the source
    let bytes = con
        .get(&key, options)
        .map_err(|e| e.for_op("copy", from.to_string()))?
        .marshal();
    *copied_bytes += bytes.len() as u64;
    if options.accumulated_copy_size_limit > 0
        && *copied_bytes >= options.accumulated_copy_size_limit
    {
        return Err(PatchError::CopySizeExceeded {
            limit: options.accumulated_copy_size_limit,
            accumulated: *copied_bytes,
        });
    }
    let Some((target, target_key)) = find_object(root, &op.path, options) else {
        return Err(PatchError::Missing.for_op("copy", op.path.to_string()));
    };
    target
        .insert_child(&target_key, Node::new(&bytes), options)
        .map(|_| ())
        .map_err(|e| e.for_op("copy", op.path.to_string()))
}

fn apply_test(root: &mut Node, op: &Operation, options: &PatchOptions) -> Result<(), PatchError> {
    let expected = value_node(op);
    if op.path.is_empty() {
        if root.equal(&expected) {
            return Ok(());
        }
        return Err(PatchError::TestFailed {
            path: op.path.to_string(),
            expected: expected.to_string(),
            actual: root.to_string(),
        });
    }
    let Some((mut con, key)) = find_object(root, &op.path, options) else {
        return Err(PatchError::Missing.for_op("test", op.path.to_string()));
    };
    // a missing final key reads as null
    let actual = match con.get(&key, options) {
        Ok(node) => Some(node),
        Err(PatchError::Missing) => None,
        Err(e) => return Err(e.for_op("test", op.path.to_string())),
    };
    match actual {
        None => {
            if expected.is_null() {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: op.path.to_string(),
                    expected: expected.to_string(),
                    actual: "null".to_string(),
                })
            }
        }
        Some(node) => {
            if node.equal(&expected) {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: op.path.to_string(),
                    expected: expected.to_string(),
                    actual: node.to_string(),
                })
            }
        }
    }
}

/// Creates the missing intermediate containers along `keys` (all but the
/// final key). The shape of each created container follows the *next* key:
/// index keys produce arrays (padded with nulls up to the index), anything
/// else a map.
fn ensure_path(
    node: &mut Node,
    keys: &[EncodedKey],
    options: &PatchOptions,
) -> Result<(), PatchError> {
    if keys.len() <= 1 {
        return Ok(());
    }
    let key = &keys[0];
    let next = &keys[1];
    node.into_container()?;
    let descend = node
        .probe(key, options)
        .map_or(false, Node::is_container_kind);
    let child = if descend {
        node.into_container()?.child(key, options)?
    } else {
        create_intermediate(node, key, next, options)?
    };
    ensure_path(child, &keys[1..], options)
}

fn create_intermediate<'a>(
    node: &'a mut Node,
    key: &EncodedKey,
    next: &EncodedKey,
    options: &PatchOptions,
) -> Result<&'a mut Node, PatchError> {
    // descending into an existing array past its end: pad with nulls so the
    // insertion below lands exactly at the requested index
    if let Ok(idx) = key.to_int() {
        if let ContainerMut::Array(items) = node.into_container()? {
            while idx > items.len() as i64 {
                items.push(Node::null());
            }
        }
    }
    let created = if next.is_index() {
        let pad = if next.is_minus() {
            0
        } else {
            let i = next.to_int()?;
            if i >= 0 {
                i
            } else if !options.support_negative_indices || i < -1 {
                return Err(PatchError::InvalidIndex(format!(
                    "unable to ensure path for index {i}"
                )));
            } else {
                0
            }
        };
        let mut out = Vec::new();
        cbor::write_head(&mut out, MAJOR_ARRAY, pad as u64);
        out.extend(std::iter::repeat(0xf6).take(pad as usize));
        Node::from_raw(out)
    } else {
        Node::new(RAW_EMPTY_MAP)
    };
    node.into_container()?.insert_child(key, created, options)
}
