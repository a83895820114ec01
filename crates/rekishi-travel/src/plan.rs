//! Version diffing: which ops a travel needs, and in which direction.

use std::ops::Range;

use rekishi_ops::{Apply, Invert, OpLog, RangeError, Version};
use strum::{Display, EnumString};
use tracing::trace;

/// Which way through the log a travel walks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    /// Apply ops in log order.
    Forward,
    /// Apply inverted ops in reverse log order.
    Backward,
    /// Apply nothing.
    Stay,
}

/// The op range and direction needed to move between two versions.
///
/// | from vs to | ops | order |
/// |---|---|---|
/// | `from < to` | `[from, to)` | log order, as-is |
/// | `from > to` | `[to, from)` | reverse log order, each inverted |
/// | `from == to` | none | n/a |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TravelPlan {
    pub from: Version,
    pub to: Version,
}

impl TravelPlan {
    pub fn between(from: Version, to: Version) -> Self {
        Self { from, to }
    }

    pub fn direction(&self) -> Direction {
        match self.from.cmp(&self.to) {
            std::cmp::Ordering::Less => Direction::Forward,
            std::cmp::Ordering::Greater => Direction::Backward,
            std::cmp::Ordering::Equal => Direction::Stay,
        }
    }

    /// Log indices this plan touches, always ascending.
    pub fn op_range(&self) -> Range<Version> {
        self.from.min(self.to)..self.from.max(self.to)
    }

    /// Number of ops applied by this plan.
    pub fn op_count(&self) -> usize {
        self.from.abs_diff(self.to)
    }

    /// Run the plan against `document`, returning how many ops were applied.
    ///
    /// # Errors
    ///
    /// [`RangeError`] if the plan does not fit inside `log`. Nothing is
    /// applied in that case.
    pub fn execute<O, D>(&self, log: &OpLog<O>, document: &mut D) -> Result<usize, RangeError>
    where
        O: Invert,
        D: Apply<O>,
    {
        let range = self.op_range();
        let ops = log.slice(range.start, range.end)?;

        match self.direction() {
            Direction::Forward => {
                for (i, op) in ops.iter().enumerate() {
                    trace!(index = range.start + i, "apply forward");
                    document.apply(op);
                }
            }
            Direction::Backward => {
                for (i, op) in ops.iter().enumerate().rev() {
                    trace!(index = range.start + i, "apply inverted");
                    document.apply(&op.invert());
                }
            }
            Direction::Stay => {}
        }

        Ok(ops.len())
    }
}
