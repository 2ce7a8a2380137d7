//! Read-only queries: value lookup and conjunctive subtree search.

use crate::container::ContainerMut;
use crate::error::PatchError;
use crate::node::Node;
use crate::patch::apply::find_object;
use crate::patch::types::PatchOptions;
use crate::path::Path;

/// A located subtree: its path from the root and its serialized value.
#[derive(Debug, Clone, PartialEq)]
pub struct PathValue {
    pub path: Path,
    pub value: Vec<u8>,
}

impl PathValue {
    pub fn new(path: Path, value: Vec<u8>) -> PathValue {
        PathValue { path, value }
    }
}

/// Returns the serialized value at `path` in an encoded document.
pub fn get_value(doc: &[u8], path: &Path) -> Result<Vec<u8>, PatchError> {
    Node::new(doc).get_value(path, &PatchOptions::default())
}

/// Returns the subtrees of an encoded document satisfying all predicates.
pub fn find_children(doc: &[u8], tests: &[PathValue]) -> Result<Vec<PathValue>, PatchError> {
    Node::new(doc).find_children(tests, &PatchOptions::default())
}

impl Node {
    /// Resolves `path` to the node it names. The empty path is the node
    /// itself.
    pub fn get_child(
        &mut self,
        path: &Path,
        options: &PatchOptions,
    ) -> Result<&mut Node, PatchError> {
        if path.is_empty() {
            return Ok(self);
        }
        let Some((con, key)) = find_object(self, path, options) else {
            return Err(PatchError::Missing);
        };
        con.child(&key, options)
    }

    /// Resolves `path` and returns the target re-serialized.
    pub fn get_value(
        &mut self,
        path: &Path,
        options: &PatchOptions,
    ) -> Result<Vec<u8>, PatchError> {
        Ok(self.get_child(path, options)?.marshal())
    }

    /// Finds every container subtree (the root included) matching the first
    /// predicate, then filters the matches through the remaining predicates
    /// in order, stopping early once nothing is left.
    ///
    /// Each predicate asserts that walking its sub-path from the candidate
    /// reaches a value equal to its expected value (empty bytes meaning
    /// null); a sub-path must carry at least one key.
    pub fn find_children(
        &mut self,
        tests: &[PathValue],
        options: &PatchOptions,
    ) -> Result<Vec<PathValue>, PatchError> {
        let Some((first, rest)) = tests.split_first() else {
            return Ok(Vec::new());
        };
        let expected = Node::new(&first.value);
        query_path(&first.path)?;
        let mut found = Vec::new();
        collect(self, &expected, &Path::root(), &first.path, options, &mut found);
        for test in rest {
            query_path(&test.path)?;
            let expected = Node::new(&test.value);
            found.retain(|pv| {
                let mut candidate = Node::new(&pv.value);
                assert_subpath(&mut candidate, &test.path, &expected, options)
            });
            if found.is_empty() {
                break;
            }
        }
        Ok(found)
    }
}

fn query_path(path: &Path) -> Result<(), PatchError> {
    if path.is_empty() {
        return Err(PatchError::InvalidPath("empty query path".to_string()));
    }
    Ok(())
}

/// Pre-order traversal: the node itself first, then array elements by index,
/// then map values in the map's internal key order.
fn collect(
    node: &mut Node,
    expected: &Node,
    at: &Path,
    subpath: &Path,
    options: &PatchOptions,
    out: &mut Vec<PathValue>,
) {
    if !node.is_container_kind() || node.into_container().is_err() {
        return;
    }
    if assert_subpath(node, subpath, expected, options) {
        out.push(PathValue::new(at.clone(), node.marshal()));
    }
    match node.into_container() {
        Ok(ContainerMut::Array(items)) => {
            for (i, child) in items.iter_mut().enumerate() {
                collect(child, expected, &at.with_index(i as i64), subpath, options, out);
            }
        }
        Ok(ContainerMut::Map(entries)) => {
            for (key, child) in entries.iter_mut() {
                collect(child, expected, &at.with_key(key.clone()), subpath, options, out);
            }
        }
        Err(_) => {}
    }
}

/// The assertion rule: walk the sub-path with plain gets; any missing step
/// fails, and at the final step a null resolves equal only to a null
/// expectation.
fn assert_subpath(
    node: &mut Node,
    subpath: &Path,
    expected: &Node,
    options: &PatchOptions,
) -> bool {
    let Some((parents, last)) = subpath.split_last() else {
        return false;
    };
    let Ok(mut con) = node.into_container() else {
        return false;
    };
    for key in parents {
        let Ok(child) = con.child(key, options) else {
            return false;
        };
        let Ok(next) = child.into_container() else {
            return false;
        };
        con = next;
    }
    match con.child(last, options) {
        Ok(child) => {
            if child.is_null() {
                expected.is_null()
            } else {
                child.equal(expected)
            }
        }
        Err(_) => false,
    }
}
