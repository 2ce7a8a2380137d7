//! JSON Pointer (RFC 6901) token utilities.
//!
//! This crate only deals with the *string* surface of JSON Pointers: splitting
//! a pointer into unescaped reference tokens and assembling tokens back into a
//! pointer. How a token is interpreted (integer array index, text map key, the
//! `-` append sentinel) is the business of the consuming engine; the helpers
//! here just classify.

use thiserror::Error;

mod util;

pub use util::{
    escape_token, format_pointer, is_append_token, is_integer_token, parse_pointer,
    unescape_token,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/', got {0:?}")]
    MissingLeadingSlash(String),
}
