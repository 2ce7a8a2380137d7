//! Error taxonomy for the patch engine.
//!
//! Container- and key-level failures carry the stable identifier in their
//! message; operation-level failures wrap the cause with the operation name
//! and the display form of the offending path.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// A referenced map key or document path does not exist.
    #[error("missing value")]
    Missing,

    /// Bytes that cannot be used as a map key (wrong major type, or not
    /// well-formed CBOR).
    #[error("invalid key, {0}")]
    InvalidKey(String),

    /// An array access with an index that is out of range or not an integer.
    #[error("invalid index referenced, {0}")]
    InvalidIndex(String),

    /// An operation record that violates the per-operation field rules.
    #[error("invalid operation, {0}")]
    InvalidOperation(String),

    /// A path that cannot be parsed or rendered on the requested surface.
    #[error("invalid path, {0}")]
    InvalidPath(String),

    /// A `test` operation whose target does not equal the expected value.
    #[error("test operation for path {path} failed, expected {expected}, got {actual}")]
    TestFailed {
        path: String,
        expected: String,
        actual: String,
    },

    /// The running total of deep-copied bytes in one patch reached the
    /// configured quota.
    #[error("unable to copy, accumulated size {accumulated} reaches the limit {limit}")]
    CopySizeExceeded { limit: u64, accumulated: u64 },

    /// A CBOR item that cannot be represented on the requested surface.
    #[error("unknown object type")]
    UnknownType,

    /// Malformed, truncated or indefinite-length CBOR, or a node used where
    /// a container is required.
    #[error("invalid node detected")]
    InvalidNode,

    /// Two identical keys in a single decoded map.
    #[error("duplicate map key {0}")]
    DuplicateKey(String),

    /// A container-level failure wrapped with the operation and path that
    /// triggered it.
    #[error("{op} operation does not apply for {path}, {source}")]
    OpFailed {
        op: &'static str,
        path: String,
        #[source]
        source: Box<PatchError>,
    },
}

impl PatchError {
    pub(crate) fn for_op(self, op: &'static str, path: String) -> PatchError {
        PatchError::OpFailed {
            op,
            path,
            source: Box::new(self),
        }
    }
}
