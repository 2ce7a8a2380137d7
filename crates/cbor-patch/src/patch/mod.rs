//! RFC 6902 operations over CBOR documents.
//!
//! `types` holds the data model, `apply` the resolution and execution logic,
//! and `codec` the two wire surfaces (JSON objects and integer-keyed CBOR
//! maps).

pub mod apply;
pub mod codec;
pub mod types;
