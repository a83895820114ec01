//! Version time-travel for op-log documents.
//!
//! Scrub a document through its history by replaying or rewinding a
//! linearized op log:
//!
//! ```text
//!   travel_to(v)          synchronous                      debounced
//!   ────────────▶ plan ──▶ apply ops ──▶ VersionChanged ──▶ settle window ──▶ Settled
//!                  │        (forward, or                      │
//!                  │         inverted in reverse)             └─ superseded by a newer
//!                  │                                             travel: no event
//!                  └─ OutOfRange: nothing applied
//! ```
//!
//! The document is always consistent with the latest requested version the
//! moment `travel_to` returns. Only the *settled* notification is debounced,
//! so expensive downstream work (re-rendering, indexing) runs once per drag
//! instead of once per slider tick.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rekishi_ops::{Component, JsonDocument, JsonOp, OpLog};
//! use rekishi_travel::{TimeTravel, TravelConfig, TravelOutcome};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), rekishi_travel::TravelError> {
//! let log: OpLog<JsonOp> = (0..10)
//!     .map(|_| JsonOp::single(Component::number_add(["counter"], 1)))
//!     .collect();
//! let base = JsonDocument::new(json!({"counter": 0}));
//!
//! let mut travel = TimeTravel::from_base(Arc::new(log), base, 10, TravelConfig::default())?;
//! travel.travel_to(3)?;
//! travel.travel_to(5)?;
//! let last = travel.travel_to(7)?;
//!
//! assert_eq!(last.outcome().await, TravelOutcome::Settled(7));
//! # Ok(())
//! # }
//! ```

mod config;
pub mod constants;
mod controller;
mod events;
mod plan;
mod session;
mod settle;

pub use config::{ConfigError, TravelConfig};
pub use controller::{TimeTravel, TravelError};
pub use events::{TravelEvent, TravelSeq};
pub use plan::{Direction, TravelPlan};
pub use session::{HistorySession, Unfurl, UnfurlError, Unfurler, parse_version};
pub use settle::{TravelHandle, TravelOutcome, TravelPhase};

pub use rekishi_ops::Version;
