//! Ordered, immutable op log indexed by version.

use serde::{Deserialize, Serialize};

use tracing::debug;

use crate::{InvalidOp, Invert, JsonDocument, JsonOp, OpError, RangeError};

/// Count of ops applied from the base document.
///
/// A document "at version `v`" has had ops `[0, v)` applied.
pub type Version = usize;

/// An ordered sequence of ops, indices `0..N-1`.
///
/// Applying ops `[0, v)` in order to the base document yields version `v`,
/// so the log's length is also its maximum version. The log is read-only
/// once built; hosts share it behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpLog<O> {
    ops: Vec<O>,
}

impl<O> Default for OpLog<O> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<O> OpLog<O> {
    pub fn new(ops: Vec<O>) -> Self {
        Self { ops }
    }

    /// Number of ops (= the maximum version).
    pub fn len(&self) -> Version {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The op that takes version `v` to `v + 1`.
    pub fn get(&self, v: Version) -> Option<&O> {
        self.ops.get(v)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, O> {
        self.ops.iter()
    }

    /// Ops in log order for versions `[low, high)`.
    ///
    /// # Errors
    ///
    /// [`RangeError`] unless `low <= high <= len()`.
    pub fn slice(&self, low: Version, high: Version) -> Result<&[O], RangeError> {
        if low > high || high > self.ops.len() {
            return Err(RangeError { low, high, len: self.ops.len() });
        }
        Ok(&self.ops[low..high])
    }
}

impl<O> From<Vec<O>> for OpLog<O> {
    fn from(ops: Vec<O>) -> Self {
        Self::new(ops)
    }
}

impl<O> FromIterator<O> for OpLog<O> {
    fn from_iter<I: IntoIterator<Item = O>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, O> IntoIterator for &'a OpLog<O> {
    type Item = &'a O;
    type IntoIter = std::slice::Iter<'a, O>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl OpLog<JsonOp> {
    /// Replay the whole log from `base`, then rewind it with inverted ops,
    /// returning the head document.
    ///
    /// Loaded logs are checked this way once, up front, so later travels in
    /// either direction never meet an op that does not fit.
    ///
    /// # Errors
    ///
    /// [`InvalidOp`] naming the first op that fails to apply, forward or
    /// inverted. A rewind that does not land back on `base` is reported
    /// against op 0.
    pub fn validate_from(&self, base: &JsonDocument) -> Result<JsonDocument, InvalidOp> {
        let mut doc = base.clone();
        for (version, op) in self.ops.iter().enumerate() {
            doc.try_apply(op)
                .map_err(|source| InvalidOp { version, inverted: false, source })?;
        }
        let head = doc.clone();

        for (version, op) in self.ops.iter().enumerate().rev() {
            doc.try_apply(&op.invert())
                .map_err(|source| InvalidOp { version, inverted: true, source })?;
        }
        if &doc != base {
            return Err(InvalidOp {
                version: 0,
                inverted: true,
                source: OpError::ValueMismatch { path: "$".into() },
            });
        }

        debug!(ops = self.ops.len(), "op log validated both ways");
        Ok(head)
    }
}
