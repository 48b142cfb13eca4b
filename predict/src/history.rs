//! Paired input and state history for replay.

use std::num::NonZeroUsize;

use payload::{InputPayload, StatePayload};
use timeline::{RingError, SlotLookup, Tick, TickRing};

/// Input and state rings of the same capacity, indexed by tick.
///
/// The state ring is the single source of truth the render layer reads.
/// Only the predictor writes new ticks; reconciliation overwrites old ones.
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    inputs: TickRing<InputPayload>,
    states: TickRing<StatePayload>,
}

impl PredictionHistory {
    /// Creates empty rings.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::CapacityNotPowerOfTwo`] for other capacities.
    pub fn new(capacity: NonZeroUsize) -> Result<Self, RingError> {
        Ok(Self {
            inputs: TickRing::new(capacity)?,
            states: TickRing::new(capacity)?,
        })
    }

    /// Slots per ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.states.capacity()
    }

    /// Stores a copy of `input` at its tick.
    pub fn record_input(&mut self, input: InputPayload) -> Result<(), RingError> {
        self.inputs.insert(input.tick(), input).map(|_| ())
    }

    /// Stores a copy of `state` at its tick, replacing any earlier value.
    pub fn record_state(&mut self, state: StatePayload) -> Result<(), RingError> {
        self.states.insert(state.tick(), state).map(|_| ())
    }

    /// Input recorded for `tick`, if its slot still holds it.
    #[must_use]
    pub fn input_at(&self, tick: Tick) -> Option<&InputPayload> {
        self.inputs.get(tick)
    }

    /// Predicted state for `tick`, if its slot still holds it.
    #[must_use]
    pub fn state_at(&self, tick: Tick) -> Option<&StatePayload> {
        self.states.get(tick)
    }

    /// Reads the state slot for `tick`, distinguishing empty and stale slots.
    #[must_use]
    pub fn state_lookup(&self, tick: Tick) -> SlotLookup<'_, StatePayload> {
        self.states.lookup(tick)
    }

    /// Newest predicted state.
    #[must_use]
    pub fn latest_state(&self) -> Option<&StatePayload> {
        self.states.newest().map(|(_, state)| state)
    }

    /// State at `tick - 1`, or the newest state if that slot is gone.
    #[must_use]
    pub fn prior_state(&self, tick: Tick) -> Option<&StatePayload> {
        tick.prev()
            .and_then(|prev| self.state_at(prev))
            .or_else(|| self.latest_state())
    }

    /// Input ring.
    #[must_use]
    pub const fn inputs(&self) -> &TickRing<InputPayload> {
        &self.inputs
    }

    /// State ring.
    #[must_use]
    pub const fn states(&self) -> &TickRing<StatePayload> {
        &self.states
    }

    /// Empties both rings.
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.states.clear();
    }
}
