//! Patch data model: operations, the patch sequence, and apply options.

use std::fmt;

use crate::error::PatchError;
use crate::path::Path;

/// Operation discriminant. The wire codes are part of the CBOR surface
/// (`1` = add ... `6` = test, `0` reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Add = 1,
    Remove = 2,
    Replace = 3,
    Move = 4,
    Copy = 5,
    Test = 6,
}

impl OpCode {
    pub fn from_code(code: u64) -> Result<OpCode, PatchError> {
        match code {
            1 => Ok(OpCode::Add),
            2 => Ok(OpCode::Remove),
            3 => Ok(OpCode::Replace),
            4 => Ok(OpCode::Move),
            5 => Ok(OpCode::Copy),
            6 => Ok(OpCode::Test),
            other => Err(PatchError::InvalidOperation(format!(
                "unexpected op code {other}"
            ))),
        }
    }

    pub fn from_name(name: &str) -> Result<OpCode, PatchError> {
        match name {
            "add" => Ok(OpCode::Add),
            "remove" => Ok(OpCode::Remove),
            "replace" => Ok(OpCode::Replace),
            "move" => Ok(OpCode::Move),
            "copy" => Ok(OpCode::Copy),
            "test" => Ok(OpCode::Test),
            other => Err(PatchError::InvalidOperation(format!(
                "unexpected operation {other:?}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Add => "add",
            OpCode::Remove => "remove",
            OpCode::Replace => "replace",
            OpCode::Move => "move",
            OpCode::Copy => "copy",
            OpCode::Test => "test",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single patch step: discriminant, target path, optional source path
/// (move/copy) and optional raw-CBOR value (add/replace/test).
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub op: OpCode,
    pub from: Option<Path>,
    pub path: Path,
    pub value: Option<Vec<u8>>,
}

impl Operation {
    pub fn new(op: OpCode, path: Path) -> Operation {
        Operation {
            op,
            from: None,
            path,
            value: None,
        }
    }

    pub fn with_from(mut self, from: Path) -> Operation {
        self.from = Some(from);
        self
    }

    pub fn with_value(mut self, value: Vec<u8>) -> Operation {
        self.value = Some(value);
        self
    }

    /// Checks the per-operation field rules before any side effect.
    pub fn validate(&self) -> Result<(), PatchError> {
        let fail = |msg: &str| Err(PatchError::InvalidOperation(msg.to_string()));
        match self.op {
            OpCode::Add | OpCode::Replace => {
                if self.from.is_some() {
                    return fail("\"from\" must be absent for this operation");
                }
                if self.value.is_none() {
                    return fail("\"value\" is required for this operation");
                }
            }
            OpCode::Remove => {
                if self.from.is_some() {
                    return fail("\"from\" must be absent for \"remove\"");
                }
                if self.value.is_some() {
                    return fail("\"value\" must be absent for \"remove\"");
                }
            }
            OpCode::Move | OpCode::Copy => {
                if self.from.is_none() {
                    return fail("\"from\" is required for this operation");
                }
                if self.value.is_some() {
                    return fail("\"value\" must be absent for this operation");
                }
            }
            OpCode::Test => {
                if self.from.is_some() {
                    return fail("\"from\" must be absent for \"test\"");
                }
            }
        }
        Ok(())
    }
}

/// An ordered sequence of operations, applied left to right. A failing
/// operation aborts the patch; earlier mutations are kept in the working
/// node (the caller still owns the original bytes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(pub Vec<Operation>);

impl Patch {
    pub fn new(ops: Vec<Operation>) -> Patch {
        Patch(ops)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-invocation behavior switches.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Allow negative array indices counting from the end. Default true.
    pub support_negative_indices: bool,
    /// Quota in bytes for the running total of deep copies made by `copy`
    /// operations within one patch. `0` means unlimited. Default 0.
    pub accumulated_copy_size_limit: u64,
    /// Turn `remove` of a missing path into a no-op. Default false.
    pub allow_missing_path_on_remove: bool,
    /// Create missing intermediate containers on `add`. Default false.
    pub ensure_path_exists_on_add: bool,
}

impl Default for PatchOptions {
    fn default() -> PatchOptions {
        PatchOptions {
            support_negative_indices: true,
            accumulated_copy_size_limit: 0,
            allow_missing_path_on_remove: false,
            ensure_path_exists_on_add: false,
        }
    }
}
