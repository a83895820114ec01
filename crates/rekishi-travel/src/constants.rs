//! Time-travel configuration defaults.
//!
//! Centralizes tunable values so they can be documented and overridden
//! through [`TravelConfig`](crate::TravelConfig).

use std::time::Duration;

/// How long a travel stays in flight before it is reported as settled.
///
/// Long enough that a slider drag produces one settle instead of one per
/// intermediate position, short enough to feel immediate once the drag stops.
pub const DEFAULT_SETTLE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Buffered [`TravelEvent`](crate::TravelEvent)s per subscriber before slow
/// receivers start lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;
