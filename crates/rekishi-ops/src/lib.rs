//! Op log and replay capabilities for rekishi.
//!
//! A document at version `v` is the base document with ops `[0, v)` of an
//! [`OpLog`] applied in order. Moving between versions only needs two
//! capabilities from the operation and document types:
//!
//! - [`Invert`]: produce an op that undoes another op's effect
//! - [`Apply`]: mutate a document in place with one op
//!
//! Everything else (which slice to take, in which order, inverted or not)
//! belongs to the time-travel controller in `rekishi-travel`.
//!
//! # Reference Ops
//!
//! The crate ships a json0-style op type ([`JsonOp`]) and a JSON document
//! ([`JsonDocument`]) so logs can be loaded from disk and replayed without a
//! host editor. Hosts with their own OT types implement the two traits and
//! ignore the reference types entirely.

mod document;
mod error;
mod log;
mod ops;

pub use document::JsonDocument;
pub use error::{InvalidOp, OpError, RangeError};
pub use log::{OpLog, Version};
pub use ops::{Action, ActionKind, Component, JsonOp, PathSegment};

/// Result type for reference op application.
pub type Result<T> = std::result::Result<T, OpError>;

/// An operation with a well-defined inverse.
///
/// Implementations must satisfy, for any document state `S` the op applies
/// cleanly to: `apply(apply(S, op), op.invert()) == S`, and
/// `op.invert().invert()` has the same effect as `op`.
pub trait Invert: Sized {
    /// Produce the op that undoes `self`.
    fn invert(&self) -> Self;
}

/// A document state that can be mutated in place by ops of type `O`.
///
/// The caller guarantees ops arrive in log order (or inverted in reverse log
/// order), so an implementation never sees an op out of sequence.
pub trait Apply<O> {
    /// Apply a single op to this document.
    fn apply(&mut self, op: &O);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter_log(steps: i64) -> OpLog<JsonOp> {
        (0..steps)
            .map(|_| JsonOp::single(Component::number_add(["counter"], 1)))
            .collect()
    }

    #[test]
    fn test_replay_reconstructs_each_version() {
        let log = counter_log(3);

        for v in 0..=log.len() {
            let mut doc = JsonDocument::new(json!({"counter": 0}));
            for op in log.slice(0, v).unwrap() {
                doc.apply(op);
            }
            assert_eq!(doc.root(), &json!({"counter": v}));
        }
    }

    #[test]
    fn test_inverted_suffix_walks_back() {
        let log = counter_log(3);
        let mut doc = JsonDocument::new(json!({"counter": 3}));

        for op in log.slice(1, 3).unwrap().iter().rev() {
            doc.apply(&op.invert());
        }

        assert_eq!(doc.root(), &json!({"counter": 1}));
    }

    #[test]
    fn test_log_validates_against_base() {
        let log: OpLog<JsonOp> = vec![
            JsonOp::single(Component::object_insert(["title"], json!("draft"))),
            JsonOp::single(Component::string_insert(["title"], 5, " one")),
            JsonOp::single(Component::object_replace(["title"], json!("draft one"), json!("final"))),
        ]
        .into();

        let head = log.validate_from(&JsonDocument::new(json!({}))).unwrap();
        assert_eq!(head.root(), &json!({"title": "final"}));
    }

    #[test]
    fn test_log_validation_reports_failing_version() {
        let log: OpLog<JsonOp> = vec![
            JsonOp::single(Component::number_add(["count"], 1)),
            JsonOp::single(Component::list_delete(["items"], 0, json!("gone"))),
        ]
        .into();

        let err = log.validate_from(&JsonDocument::new(json!({"count": 0}))).unwrap_err();
        assert_eq!(err.version, 1);
        assert!(matches!(err.source, OpError::PathNotFound { .. }));
    }
}
