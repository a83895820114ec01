//! Error types for op log access and reference op application.

use thiserror::Error;

use crate::Version;

/// A version range that does not fit inside the op log.
///
/// Callers are expected to validate versions before slicing, so seeing this
/// error means version bookkeeping went wrong somewhere upstream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("op range [{low}, {high}) is invalid for a log of {len} ops")]
pub struct RangeError {
    pub low: Version,
    pub high: Version,
    pub len: Version,
}

/// Errors applying a reference [`JsonOp`](crate::JsonOp) to a
/// [`JsonDocument`](crate::JsonDocument).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    /// A path segment does not exist in the document.
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// The value at a path is not the kind the component operates on.
    #[error("expected {expected} at {path}")]
    TypeMismatch { path: String, expected: &'static str },

    /// List index or string offset past the end.
    #[error("index {index} out of bounds for length {len} at {path}")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    /// The document does not hold the value the component expects to remove
    /// or replace, or already holds a value where one is being inserted.
    #[error("document value at {path} does not match the op")]
    ValueMismatch { path: String },

    /// Numeric add overflowed an i64.
    #[error("numeric overflow at {path}")]
    Overflow { path: String },

    /// `i64::MIN` has no negation, so the add could never be undone.
    #[error("number_add delta at {path} cannot be inverted")]
    UninvertibleDelta { path: String },

    /// Object and list components need at least one path segment.
    #[error("component path is empty")]
    EmptyPath,
}

/// A logged op that cannot be applied on top of its predecessors, or whose
/// inverse cannot be applied on the way back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("op {version} cannot be applied{}: {source}", when_inverted(.inverted))]
pub struct InvalidOp {
    /// Index of the offending op (the version it would produce, minus one).
    pub version: Version,
    /// Set when the failure happened while rewinding.
    pub inverted: bool,
    #[source]
    pub source: OpError,
}

fn when_inverted(inverted: &bool) -> &'static str {
    if *inverted { " inverted" } else { "" }
}
