//! The time-travel controller.
//!
//! [`TimeTravel`] owns a document and the version it is materialized at.
//! `travel_to` computes the [`TravelPlan`] between the current and target
//! versions, runs it synchronously, publishes the new version, and opens a
//! settle window. Rapid travels coalesce: only the last one settles.
//!
//! # Invariant
//!
//! Between calls, `document()` always equals the base document with ops
//! `[0, current_version())` applied. Travels take `&mut self`, so no two
//! apply loops can overlap.

use std::sync::Arc;

use rekishi_ops::{Apply, Invert, OpLog, RangeError, Version};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info};

use crate::config::TravelConfig;
use crate::events::{TravelEvent, TravelSeq};
use crate::plan::TravelPlan;
use crate::settle::{SettleWindow, TravelHandle};

/// Errors from initializing or travelling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TravelError {
    /// Requested version is outside `[0, max]`. Nothing was applied.
    #[error("version {requested} out of range (max {max})")]
    OutOfRange { requested: Version, max: Version },

    /// Version bookkeeping disagreed with the op log. This is a bug.
    #[error("op log invariant violated: {0}")]
    Log(#[from] RangeError),

    /// Version text could not be parsed.
    #[error("invalid version {0:?}")]
    InvalidVersion(String),
}

/// Version time-travel controller over an op log.
///
/// `O` is the op type, `D` the document it applies to.
pub struct TimeTravel<O, D> {
    log: Arc<OpLog<O>>,
    document: D,
    current: Version,
    config: TravelConfig,
    events: broadcast::Sender<TravelEvent>,
    version_tx: watch::Sender<Version>,
    settle: SettleWindow,
}

impl<O, D> TimeTravel<O, D>
where
    O: Invert,
    D: Apply<O>,
{
    /// Take over a document materialized at `max_version` and rewind it to
    /// `start`.
    ///
    /// Rewinding applies ops `[start, max_version)` inverted, most recent
    /// first. When `start == max_version` the document is kept untouched.
    ///
    /// # Errors
    ///
    /// [`TravelError::OutOfRange`] if `start > max_version` or
    /// `max_version > log.len()`. The document is not mutated.
    pub fn initialize(
        log: Arc<OpLog<O>>,
        mut document: D,
        max_version: Version,
        start: Version,
        config: TravelConfig,
    ) -> Result<Self, TravelError> {
        if max_version > log.len() {
            return Err(TravelError::OutOfRange { requested: max_version, max: log.len() });
        }
        if start > max_version {
            return Err(TravelError::OutOfRange { requested: start, max: max_version });
        }

        let plan = TravelPlan::between(max_version, start);
        let rewound = plan.execute(&log, &mut document)?;
        info!(start, max_version, rewound, "time travel initialized");

        Ok(Self::assemble(log, document, start, config))
    }

    /// Replay the whole log from `base`, then rewind to `start`.
    ///
    /// # Errors
    ///
    /// [`TravelError::OutOfRange`] if `start > log.len()`; nothing is
    /// replayed in that case.
    pub fn from_base(
        log: Arc<OpLog<O>>,
        mut base: D,
        start: Version,
        config: TravelConfig,
    ) -> Result<Self, TravelError> {
        let max_version = log.len();
        if start > max_version {
            return Err(TravelError::OutOfRange { requested: start, max: max_version });
        }
        TravelPlan::between(0, max_version).execute(&log, &mut base)?;
        Self::initialize(log, base, max_version, start, config)
    }

    fn assemble(log: Arc<OpLog<O>>, document: D, current: Version, config: TravelConfig) -> Self {
        let (events, _) = broadcast::channel(config.channel_capacity());
        let (version_tx, _) = watch::channel(current);
        let settle = SettleWindow::new(config.settle_debounce, events.clone());
        Self { log, document, current, config, events, version_tx, settle }
    }

    /// The plan `travel_to(target)` would run, without running it.
    pub fn plan(&self, target: Version) -> Result<TravelPlan, TravelError> {
        self.check(target)?;
        Ok(TravelPlan::between(self.current, target))
    }

    /// Move the document to `target`.
    ///
    /// Ops are applied before this returns, and `VersionChanged` is emitted
    /// synchronously if the version moved. The returned handle tracks the
    /// settle window, which a later `travel_to` supersedes. Travelling to the
    /// current version applies nothing but still opens a window.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`TravelError::OutOfRange`] if `target > max_version()`. Nothing is
    /// applied and any pending window is left alone.
    pub fn travel_to(&mut self, target: Version) -> Result<TravelHandle, TravelError> {
        self.check(target)?;
        let plan = TravelPlan::between(self.current, target);

        // Slice before superseding anything, so a failure leaves no trace.
        let range = plan.op_range();
        if let Err(e) = self.log.slice(range.start, range.end) {
            error!("travel plan {}..{} does not fit op log: {e}", plan.from, plan.to);
            return Err(e.into());
        }

        let (ticket, handle) = self.settle.begin(target);
        let applied = plan.execute(&self.log, &mut self.document)?;
        ticket.ops_applied();
        debug!(
            seq = %handle.seq(),
            from = plan.from,
            to = plan.to,
            direction = %plan.direction(),
            applied,
            "travel applied"
        );

        self.set_current(target);
        self.settle.open(ticket);
        Ok(handle)
    }

    /// Move by `delta` versions, clamped to `[0, max_version()]`.
    pub fn travel_by(&mut self, delta: isize) -> Result<TravelHandle, TravelError> {
        let target = self.current.saturating_add_signed(delta).min(self.max_version());
        self.travel_to(target)
    }

    fn check(&self, target: Version) -> Result<(), TravelError> {
        if target > self.max_version() {
            return Err(TravelError::OutOfRange { requested: target, max: self.max_version() });
        }
        Ok(())
    }

    fn set_current(&mut self, version: Version) {
        let from = self.current;
        self.current = version;
        if from != version {
            self.version_tx.send_replace(version);
            let _ = self.events.send(TravelEvent::VersionChanged { from, to: version });
        }
    }
}

impl<O, D> TimeTravel<O, D> {
    /// Number of ops currently applied to the document.
    pub fn current_version(&self) -> Version {
        self.current
    }

    /// Highest reachable version (= log length).
    pub fn max_version(&self) -> Version {
        self.log.len()
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn log(&self) -> &Arc<OpLog<O>> {
        &self.log
    }

    pub fn config(&self) -> &TravelConfig {
        &self.config
    }

    /// Subscribe to version-change and settle events.
    pub fn subscribe(&self) -> broadcast::Receiver<TravelEvent> {
        self.events.subscribe()
    }

    /// Watch the current version.
    pub fn watch_version(&self) -> watch::Receiver<Version> {
        self.version_tx.subscribe()
    }

    /// Whether a settle window is pending.
    pub fn is_settling(&self) -> bool {
        self.settle.is_pending()
    }

    /// Sequence number of the most recent travel.
    pub fn latest_seq(&self) -> TravelSeq {
        self.settle.latest()
    }
}
