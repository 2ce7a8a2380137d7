//! RFC 6902 patch semantics applied directly to CBOR (RFC 8949) documents,
//! with no round-trip through a textual format.
//!
//! A document is wrapped in a lazily-parsed [`Node`]: containers split one
//! level at a time as paths walk into them, and untouched branches keep
//! their original bytes. On top of that sit the four capabilities:
//!
//! - [`Patch`] — ordered `add`/`remove`/`replace`/`move`/`copy`/`test`
//!   mutations, decoded from JSON or from integer-keyed CBOR maps;
//! - [`get_value`] — read the value at a path;
//! - [`equal`] — structural equality of two documents;
//! - [`find_children`] — locate subtrees satisfying a conjunction of
//!   path/value predicates.
//!
//! Paths address map keys by their canonical encoding ([`EncodedKey`]), so
//! integer and byte-string keys work alongside text keys; the JSON Pointer
//! surface covers the text/integer subset.
//!
//! ```
//! use cbor_patch::{from_json, to_json, Patch};
//!
//! let doc = from_json(r#"{"foo":"bar"}"#)?;
//! let patch = Patch::from_json(r#"[{"op":"add","path":"/baz","value":"qux"}]"#)?;
//! let out = patch.apply(&doc)?;
//! assert_eq!(to_json(&out)?, r#"{"baz":"qux","foo":"bar"}"#);
//! # Ok::<(), cbor_patch::PatchError>(())
//! ```

pub mod cbor;
mod container;
mod error;
pub mod json;
pub mod key;
pub mod node;
pub mod patch;
pub mod path;
pub mod query;

pub use cbor::{diagnostic, CborType};
pub use error::PatchError;
pub use json::{from_json, to_json};
pub use key::EncodedKey;
pub use node::Node;
pub use patch::types::{OpCode, Operation, Patch, PatchOptions};
pub use path::Path;
pub use query::{find_children, get_value, PathValue};

/// Structural equality of two encoded documents.
pub fn equal(a: &[u8], b: &[u8]) -> bool {
    Node::new(a).equal(&Node::new(b))
}
