//! Reconciliation of predictions against authoritative state.

use payload::StatePayload;
use timeline::{SlotLookup, Tick};
use tracing::trace;

use crate::history::PredictionHistory;
use crate::simulator::MovementSimulator;

/// Where the engine stands relative to the newest authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    /// No authoritative state received this session.
    Uninitialized,
    /// The latest authoritative state has been processed.
    Idle,
    /// A newer authoritative state is waiting for the next poll.
    CorrectionPending,
}

/// How a correction should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionSeverity {
    /// Within the snap threshold; the render layer may ease it in.
    Smooth,
    /// Beyond the snap threshold; jump straight to the corrected state.
    Snap,
}

/// Result of one reconciliation poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Nothing new to process.
    Idle,
    /// The authoritative tick is newer than anything predicted; ignored.
    Ahead { tick: Tick, current: Tick },
    /// The predicted state for the tick is no longer in the history window.
    Expired { tick: Tick },
    /// The prediction matched within epsilon; history untouched.
    Agreed { tick: Tick, error: f32 },
    /// The prediction was overwritten and later ticks replayed.
    Corrected {
        tick: Tick,
        error: f32,
        replayed: usize,
        severity: CorrectionSeverity,
    },
}

/// Tracks authoritative state and rewrites history when predictions diverge.
///
/// Corrections are detected by tick, not by value: a state is only processed
/// once, and only if it is newer than everything seen before.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    latest: Option<StatePayload>,
    last_processed: Option<StatePayload>,
    epsilon: f32,
    snap_threshold: f32,
}

impl ReconciliationEngine {
    /// Engine with no authoritative state yet.
    #[must_use]
    pub const fn new(epsilon: f32, snap_threshold: f32) -> Self {
        Self {
            latest: None,
            last_processed: None,
            epsilon,
            snap_threshold,
        }
    }

    /// Derived from which states have arrived and been applied.
    #[must_use]
    pub fn phase(&self) -> ReconcilePhase {
        match (&self.latest, &self.last_processed) {
            (None, _) => ReconcilePhase::Uninitialized,
            (Some(latest), Some(processed)) if latest.tick() == processed.tick() => {
                ReconcilePhase::Idle
            }
            (Some(_), _) => ReconcilePhase::CorrectionPending,
        }
    }

    /// Newest authoritative state accepted.
    #[must_use]
    pub const fn latest_server_state(&self) -> Option<&StatePayload> {
        self.latest.as_ref()
    }

    /// Authoritative state most recently reconciled against.
    #[must_use]
    pub const fn last_processed_state(&self) -> Option<&StatePayload> {
        self.last_processed.as_ref()
    }

    /// Offers an authoritative state.
    ///
    /// Returns `false`, changing nothing, if the state is not newer than both
    /// the last processed state and any pending one.
    pub fn receive(&mut self, state: StatePayload) -> bool {
        let newest_seen = self
            .latest
            .iter()
            .chain(self.last_processed.iter())
            .map(StatePayload::tick)
            .max();
        if newest_seen.is_some_and(|seen| state.tick() <= seen) {
            trace!(tick = state.tick().raw(), "ignored stale authoritative state");
            return false;
        }
        self.latest = Some(state);
        true
    }

    /// Processes the pending authoritative state, if any.
    ///
    /// `current` is the newest tick the caller has predicted.
    pub fn reconcile<S: MovementSimulator + ?Sized>(
        &mut self,
        history: &mut PredictionHistory,
        simulator: &S,
        current: Tick,
    ) -> ReconcileOutcome {
        if self.phase() != ReconcilePhase::CorrectionPending {
            return ReconcileOutcome::Idle;
        }
        let Some(server) = self.latest else {
            return ReconcileOutcome::Idle;
        };
        self.last_processed = Some(server);
        let tick = server.tick();

        if tick > current {
            return ReconcileOutcome::Ahead { tick, current };
        }

        let predicted = match history.state_lookup(tick) {
            SlotLookup::Hit(state) => *state,
            SlotLookup::Empty | SlotLookup::Stale { .. } => {
                return ReconcileOutcome::Expired { tick };
            }
        };

        let error = server.distance_to(&predicted);
        if error <= self.epsilon {
            return ReconcileOutcome::Agreed { tick, error };
        }

        if history.record_state(server).is_err() {
            // Not reachable for a tick that was just a hit.
            return ReconcileOutcome::Expired { tick };
        }
        let replayed = replay(history, simulator, tick, current);
        let severity = if error > self.snap_threshold {
            CorrectionSeverity::Snap
        } else {
            CorrectionSeverity::Smooth
        };
        ReconcileOutcome::Corrected {
            tick,
            error,
            replayed,
            severity,
        }
    }

    /// Forgets all authoritative state.
    pub fn reset(&mut self) {
        self.latest = None;
        self.last_processed = None;
    }
}

/// Re-simulates every tick in `(from, to]` from the state stored at `from`.
///
/// Each tick uses the input buffered for it and overwrites its state slot.
/// Ticks with no buffered input are skipped, matching a server that never
/// synthesises input. Returns the number of ticks simulated.
pub fn replay<S: MovementSimulator + ?Sized>(
    history: &mut PredictionHistory,
    simulator: &S,
    from: Tick,
    to: Tick,
) -> usize {
    let Some(mut prior) = history.state_at(from).copied() else {
        return 0;
    };
    let mut replayed = 0;
    for tick in from.after_through(to) {
        let Some(input) = history.input_at(tick).copied() else {
            continue;
        };
        let next = simulator.simulate(&prior, &input);
        if history.record_state(next).is_err() {
            break;
        }
        prior = next;
        replayed += 1;
    }
    replayed
}
