//! The mutable container face shared by map and array nodes.
//!
//! A two-variant enum with a small dispatch, not a trait object: the executor
//! is the only consumer and the variant set is closed.

use crate::error::PatchError;
use crate::key::EncodedKey;
use crate::node::{MapEntries, Node};
use crate::patch::types::PatchOptions;

#[derive(Debug)]
pub(crate) enum ContainerMut<'a> {
    Map(&'a mut MapEntries),
    Array(&'a mut Vec<Node>),
}

/// How an array index is being used: `Access` addresses an existing element
/// (`get`/`set`/`remove`), `Insert` addresses a gap (`add`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexMode {
    Access,
    Insert,
}

/// Resolves an index key against an array of `len` elements.
///
/// Negative indices count from the end (gated by the options); for `Insert`
/// the value lands before the element the index addresses, with `-(len+1)`
/// clamping to the front. The `-` sentinel is rejected here; `add` handles it
/// before resolution.
pub(crate) fn resolve_index(
    key: &EncodedKey,
    len: usize,
    mode: IndexMode,
    options: &PatchOptions,
) -> Result<usize, PatchError> {
    if key.is_minus() {
        return Err(PatchError::InvalidIndex(
            "\"-\" is only valid for add".to_string(),
        ));
    }
    let idx = to_index(key)?;
    let len = len as i64;
    match mode {
        IndexMode::Access => {
            let idx = if idx < 0 {
                if !options.support_negative_indices || idx < -len {
                    return Err(out_of_range(key));
                }
                idx + len
            } else {
                idx
            };
            if idx >= len {
                return Err(out_of_range(key));
            }
            Ok(idx as usize)
        }
        IndexMode::Insert => {
            let size = len + 1;
            if idx >= size {
                return Err(out_of_range(key));
            }
            if idx < 0 {
                if !options.support_negative_indices || idx < -size {
                    return Err(out_of_range(key));
                }
                return Ok((idx + size - 1).max(0) as usize);
            }
            Ok(idx as usize)
        }
    }
}

fn to_index(key: &EncodedKey) -> Result<i64, PatchError> {
    key.to_int().map_err(|e| match e {
        PatchError::InvalidKey(msg) => PatchError::InvalidIndex(msg),
        other => other,
    })
}

fn out_of_range(key: &EncodedKey) -> PatchError {
    PatchError::InvalidIndex(format!("unable to access index {key}"))
}

impl<'a> ContainerMut<'a> {
    pub(crate) fn len(&self) -> usize {
        match self {
            ContainerMut::Map(m) => m.len(),
            ContainerMut::Array(a) => a.len(),
        }
    }

    pub(crate) fn reborrow(&mut self) -> ContainerMut<'_> {
        match self {
            ContainerMut::Map(m) => ContainerMut::Map(m),
            ContainerMut::Array(a) => ContainerMut::Array(a),
        }
    }

    /// Looks up an existing entry, consuming the container borrow so the
    /// result can outlive it (this is what path walking rebinds on).
    pub(crate) fn child(
        self,
        key: &EncodedKey,
        options: &PatchOptions,
    ) -> Result<&'a mut Node, PatchError> {
        match self {
            ContainerMut::Map(m) => m.get_mut(key).ok_or(PatchError::Missing),
            ContainerMut::Array(a) => {
                let idx = resolve_index(key, a.len(), IndexMode::Access, options)?;
                Ok(&mut a[idx])
            }
        }
    }

    /// Looks up an existing entry without consuming the container.
    pub(crate) fn get(
        &mut self,
        key: &EncodedKey,
        options: &PatchOptions,
    ) -> Result<&mut Node, PatchError> {
        self.reborrow().child(key, options)
    }

    /// Overwrites an existing entry; the caller has already proven the key
    /// exists (this backs `replace`).
    pub(crate) fn set(
        &mut self,
        key: &EncodedKey,
        value: Node,
        options: &PatchOptions,
    ) -> Result<(), PatchError> {
        match self {
            ContainerMut::Map(m) => {
                m.insert(key.clone(), value);
                Ok(())
            }
            ContainerMut::Array(a) => {
                let idx = resolve_index(key, a.len(), IndexMode::Access, options)?;
                a[idx] = value;
                Ok(())
            }
        }
    }

    /// Inserts a value and returns a borrow of it.
    ///
    /// Maps insert-or-replace (RFC 6902 §4.1: adding to an existing member
    /// replaces it). Arrays insert at the resolved position, shifting the
    /// tail right; the `-` key appends.
    pub(crate) fn insert_child(
        self,
        key: &EncodedKey,
        value: Node,
        options: &PatchOptions,
    ) -> Result<&'a mut Node, PatchError> {
        match self {
            ContainerMut::Map(m) => Ok(match m.entry(key.clone()) {
                std::collections::btree_map::Entry::Occupied(mut e) => {
                    e.insert(value);
                    e.into_mut()
                }
                std::collections::btree_map::Entry::Vacant(e) => e.insert(value),
            }),
            ContainerMut::Array(a) => {
                if key.is_minus() {
                    a.push(value);
                    let last = a.len() - 1;
                    return Ok(&mut a[last]);
                }
                let idx = resolve_index(key, a.len(), IndexMode::Insert, options)?;
                a.insert(idx, value);
                Ok(&mut a[idx])
            }
        }
    }

    pub(crate) fn add(
        &mut self,
        key: &EncodedKey,
        value: Node,
        options: &PatchOptions,
    ) -> Result<(), PatchError> {
        self.reborrow().insert_child(key, value, options).map(|_| ())
    }

    /// Removes and returns an entry. With `allow_missing_path_on_remove` a
    /// missing key or out-of-range index is a silent no-op (`None`).
    pub(crate) fn remove(
        &mut self,
        key: &EncodedKey,
        options: &PatchOptions,
    ) -> Result<Option<Node>, PatchError> {
        match self {
            ContainerMut::Map(m) => match m.remove(key) {
                Some(node) => Ok(Some(node)),
                None if options.allow_missing_path_on_remove => Ok(None),
                None => Err(PatchError::Missing),
            },
            ContainerMut::Array(a) => {
                match resolve_index(key, a.len(), IndexMode::Access, options) {
                    Ok(idx) => Ok(Some(a.remove(idx))),
                    Err(PatchError::InvalidIndex(_)) if options.allow_missing_path_on_remove => {
                        // still reject non-integer keys and disabled negatives
                        let idx = to_index(key)?;
                        if idx < 0 && !options.support_negative_indices {
                            Err(out_of_range(key))
                        } else {
                            Ok(None)
                        }
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}
