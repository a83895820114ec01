//! Notifications emitted by a [`TimeTravel`](crate::TimeTravel) controller.
//!
//! Subscribe via [`TimeTravel::subscribe()`](crate::TimeTravel::subscribe).
//! Two kinds of event share one broadcast channel:
//!
//! - [`TravelEvent::VersionChanged`]: sent synchronously from inside
//!   `travel_to`, right after the ops are applied. Every travel that moves
//!   the version produces one, superseded or not.
//! - [`TravelEvent::Settled`]: sent once the settle window of the latest
//!   travel elapses. Superseded travels never produce one.

use std::fmt;

use rekishi_ops::Version;

/// Monotonic travel request number.
///
/// Every `travel_to` call takes the next number; a pending settle window
/// only fires if its number is still the latest when the timer elapses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TravelSeq(pub u64);

impl TravelSeq {
    pub(crate) fn next(self) -> Self {
        TravelSeq(self.0 + 1)
    }
}

impl fmt::Display for TravelSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events pushed to controller subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TravelEvent {
    /// The current version moved.
    VersionChanged { from: Version, to: Version },
    /// The latest travel's settle window elapsed without being superseded.
    Settled { seq: TravelSeq, version: Version },
}
