//! Display-side prediction for entities owned by other clients.

use std::num::NonZeroUsize;

use payload::{EntityId, InputPayload, StatePayload};
use timeline::{RingError, TickRing};

use crate::simulator::MovementSimulator;

/// Shows a remote entity ahead of its last authoritative state.
///
/// Keeps the newest authoritative state and the inputs its owner relayed;
/// the displayed state re-simulates relayed inputs newer than that state.
/// Nothing here is authoritative or sent anywhere.
#[derive(Debug, Clone)]
pub struct RemoteView {
    entity: EntityId,
    authoritative: Option<StatePayload>,
    inputs: TickRing<InputPayload>,
}

impl RemoteView {
    /// Empty view of `entity` with `capacity` input slots.
    pub fn new(entity: EntityId, capacity: NonZeroUsize) -> Result<Self, RingError> {
        Ok(Self {
            entity,
            authoritative: None,
            inputs: TickRing::new(capacity)?,
        })
    }

    /// Entity being observed.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Accepts an authoritative state newer than the current one.
    pub fn receive_state(&mut self, state: StatePayload) -> bool {
        if self
            .authoritative
            .is_some_and(|current| state.tick() <= current.tick())
        {
            return false;
        }
        self.authoritative = Some(state);
        true
    }

    /// Accepts a relayed input newer than the authoritative state.
    pub fn receive_input(&mut self, input: InputPayload) -> bool {
        if self
            .authoritative
            .is_some_and(|current| input.tick() <= current.tick())
        {
            return false;
        }
        self.inputs.insert(input.tick(), input).is_ok()
    }

    /// Newest authoritative state received.
    #[must_use]
    pub const fn authoritative_state(&self) -> Option<&StatePayload> {
        self.authoritative.as_ref()
    }

    /// Authoritative state advanced through every newer relayed input.
    ///
    /// `None` until the first authoritative state arrives.
    pub fn display_state<S: MovementSimulator + ?Sized>(
        &self,
        simulator: &S,
    ) -> Option<StatePayload> {
        let base = self.authoritative?;
        let state = self
            .inputs
            .iter()
            .filter(|(tick, _)| *tick > base.tick())
            .fold(base, |prior, (_, input)| simulator.simulate(&prior, input));
        Some(state)
    }

    /// Forgets every received state and input.
    pub fn clear(&mut self) {
        self.authoritative = None;
        self.inputs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{LinearMovement, MovementConfig};
    use payload::{Quat, Tick, Vec2, Vec3};
    use timeline::TickRate;

    fn sim() -> LinearMovement {
        LinearMovement::new(MovementConfig::new(TickRate::DEFAULT, 30.0))
    }

    fn view() -> RemoteView {
        RemoteView::new(EntityId::new(2), NonZeroUsize::new(16).unwrap()).unwrap()
    }

    fn state(tick: u64, x: f32) -> StatePayload {
        StatePayload::new(Tick::new(tick), Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
    }

    fn input(tick: u64) -> InputPayload {
        InputPayload::new(Tick::new(tick), Vec2::X, Quat::IDENTITY)
    }

    #[test]
    fn nothing_to_show_before_authoritative_state() {
        let mut view = view();
        assert!(view.receive_input(input(1)));
        assert_eq!(view.display_state(&sim()), None);
    }

    #[test]
    fn replays_relayed_inputs_past_authoritative_state() {
        let mut view = view();
        view.receive_state(state(10, 4.0));
        for tick in 11..=13 {
            assert!(view.receive_input(input(tick)));
        }
        assert_eq!(view.display_state(&sim()), Some(state(13, 7.0)));
    }

    #[test]
    fn ignores_inputs_covered_by_authoritative_state() {
        let mut view = view();
        for tick in 1..=5 {
            view.receive_input(input(tick));
        }
        view.receive_state(state(4, 0.0));
        assert!(!view.receive_input(input(3)));
        assert_eq!(view.display_state(&sim()), Some(state(5, 1.0)));
    }

    #[test]
    fn rejects_stale_authoritative_state() {
        let mut view = view();
        assert!(view.receive_state(state(8, 1.0)));
        assert!(!view.receive_state(state(8, 2.0)));
        assert!(!view.receive_state(state(2, 2.0)));
        assert_eq!(view.authoritative_state(), Some(&state(8, 1.0)));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut view = view();
        view.receive_state(state(1, 1.0));
        view.receive_input(input(2));
        view.clear();
        assert!(view.authoritative_state().is_none());
        assert_eq!(view.display_state(&sim()), None);
    }
}
