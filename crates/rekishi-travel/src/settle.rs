//! Settle window with "keep latest" coalescing.
//!
//! # State Machine
//!
//! Each travel walks these phases:
//!
//! ```text
//! Started ──▶ OpsApplied ──▶ Settling ──┬──▶ Settled     (window elapsed, latest)
//!                                       └──▶ Superseded  (newer travel arrived)
//! ```
//!
//! At most one window is pending. Starting a new travel supersedes the
//! pending one: its timer task is aborted and its handle resolves to
//! [`TravelOutcome::Superseded`]. The timer also checks its sequence number
//! against the latest one before settling, so a stale timer that already
//! woke up still no-ops.
//!
//! Only settlement is cancelable. Ops are applied synchronously before a
//! window opens and are never rolled back.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rekishi_ops::Version;
use strum::Display;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{TravelEvent, TravelSeq};

/// Lifecycle phase of a single travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TravelPhase {
    Started,
    OpsApplied,
    Settling,
    /// Terminal. The `Settled` event was emitted.
    Settled,
    /// Terminal. No event is emitted.
    Superseded,
}

impl TravelPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TravelPhase::Settled | TravelPhase::Superseded)
    }
}

/// How a travel ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelOutcome {
    /// The settle window elapsed; carries the final version.
    Settled(Version),
    /// A newer travel replaced this one before it settled (or the controller
    /// was dropped first).
    Superseded,
}

/// Caller-side view of one travel.
///
/// Returned by [`TimeTravel::travel_to`](crate::TimeTravel::travel_to).
/// Dropping the handle does not cancel anything.
#[derive(Debug, Clone)]
pub struct TravelHandle {
    seq: TravelSeq,
    target: Version,
    phase: watch::Receiver<TravelPhase>,
}

impl TravelHandle {
    pub fn seq(&self) -> TravelSeq {
        self.seq
    }

    /// The version this travel moved to.
    pub fn target(&self) -> Version {
        self.target
    }

    pub fn phase(&self) -> TravelPhase {
        *self.phase.borrow()
    }

    /// Wait until the travel settles or is superseded.
    pub async fn outcome(mut self) -> TravelOutcome {
        match self.phase.wait_for(|p| p.is_terminal()).await.map(|p| *p) {
            Ok(TravelPhase::Settled) => TravelOutcome::Settled(self.target),
            _ => TravelOutcome::Superseded,
        }
    }
}

/// A travel that has started but not yet opened its window.
pub(crate) struct Ticket {
    seq: TravelSeq,
    target: Version,
    phase: watch::Sender<TravelPhase>,
}

impl Ticket {
    pub(crate) fn ops_applied(&self) {
        self.phase.send_replace(TravelPhase::OpsApplied);
    }
}

struct Pending {
    seq: TravelSeq,
    phase: watch::Sender<TravelPhase>,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct SettleState {
    latest: TravelSeq,
    pending: Option<Pending>,
}

/// Owns the single pending settle window of a controller.
pub(crate) struct SettleWindow {
    debounce: Duration,
    state: Arc<Mutex<SettleState>>,
    events: broadcast::Sender<TravelEvent>,
}

impl SettleWindow {
    pub(crate) fn new(debounce: Duration, events: broadcast::Sender<TravelEvent>) -> Self {
        Self {
            debounce,
            state: Arc::new(Mutex::new(SettleState::default())),
            events,
        }
    }

    /// Take the next sequence number, superseding any pending window.
    pub(crate) fn begin(&self, target: Version) -> (Ticket, TravelHandle) {
        let mut state = self.state.lock();
        state.latest = state.latest.next();
        let seq = state.latest;

        if let Some(prev) = state.pending.take() {
            prev.timer.abort();
            prev.phase.send_replace(TravelPhase::Superseded);
            debug!(superseded = %prev.seq, by = %seq, "settle window superseded");
        }

        let (phase, rx) = watch::channel(TravelPhase::Started);
        let handle = TravelHandle { seq, target, phase: rx };
        (Ticket { seq, target, phase }, handle)
    }

    /// Open the settle window for `ticket`. Must run inside a Tokio runtime.
    pub(crate) fn open(&self, ticket: Ticket) {
        let Ticket { seq, target, phase } = ticket;

        // Hold the lock across spawn so the timer cannot look for its
        // pending entry before it is stored.
        let mut state = self.state.lock();
        if state.latest != seq {
            phase.send_replace(TravelPhase::Superseded);
            return;
        }

        phase.send_replace(TravelPhase::Settling);

        let shared = Arc::clone(&self.state);
        let events = self.events.clone();
        let debounce = self.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let mut state = shared.lock();
            if state.latest != seq {
                return;
            }
            if let Some(done) = state.pending.take_if(|p| p.seq == seq) {
                info!(%seq, version = target, "travel settled");
                // Event first: a resolved handle implies subscribers have it.
                let _ = events.send(TravelEvent::Settled { seq, version: target });
                done.phase.send_replace(TravelPhase::Settled);
            }
        });

        state.pending = Some(Pending { seq, phase, timer });
    }

    /// Whether a window is currently pending.
    pub(crate) fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub(crate) fn latest(&self) -> TravelSeq {
        self.state.lock().latest
    }
}

impl Drop for SettleWindow {
    fn drop(&mut self) {
        if let Some(pending) = self.state.lock().pending.take() {
            pending.timer.abort();
            pending.phase.send_replace(TravelPhase::Superseded);
        }
    }
}
