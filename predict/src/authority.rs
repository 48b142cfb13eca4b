//! The server-side authority.

use payload::{EntityId, InputPayload, Quat, StatePayload, Vec3};
use timeline::{Tick, TickRing};
use tracing::{debug, info, warn};

use crate::config::{AuthorityConfig, GapPolicy};
use crate::error::ConfigError;
use crate::simulator::MovementSimulator;
use crate::transport::{Inbox, InboxSender, StateSink};

/// A server-side correction applied on the tick timeline.
///
/// Replaces position and/or rotation in the state produced by the next
/// simulated input. The owner sees it as an ordinary divergent state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateOverride {
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
}

impl StateOverride {
    /// Override that moves the entity and keeps its facing.
    #[must_use]
    pub const fn position(position: Vec3) -> Self {
        Self {
            position: Some(position),
            rotation: None,
        }
    }

    /// Override that turns the entity and keeps its position.
    #[must_use]
    pub const fn rotation(rotation: Quat) -> Self {
        Self {
            position: None,
            rotation: Some(rotation),
        }
    }

    /// Applies the override to `state`, keeping its tick.
    #[must_use]
    pub fn apply(&self, state: &StatePayload) -> StatePayload {
        StatePayload::new(
            state.tick(),
            self.position.unwrap_or_else(|| state.position()),
            self.rotation.unwrap_or_else(|| state.rotation()),
        )
    }
}

/// Running counters, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthorityStats {
    /// Inputs simulated, including gap fills.
    pub applied: u64,
    /// Inputs at or before the last simulated tick.
    pub stale: u64,
    /// Repeated ticks within one drain.
    pub duplicates: u64,
    /// Ticks with no input that were skipped.
    pub gaps_skipped: u64,
    /// Ticks with no input filled by repeating the last input.
    pub gaps_filled: u64,
    /// States sent to the owner.
    pub broadcasts: u64,
}

/// Summary of one authoritative tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AuthorityTick {
    /// Inputs simulated this tick, including gap fills.
    pub applied: usize,
    /// Inputs rejected as stale or duplicate this tick.
    pub rejected: usize,
    /// State sent to the owner, if any input was applied.
    pub broadcast: Option<StatePayload>,
}

/// Applies one entity's inputs in tick order and publishes the result.
///
/// Inputs may arrive in any order and in any batch size; each tick drains
/// everything that has arrived, sorts it by input tick and simulates each
/// input once. The newest produced state is sent to the owner.
#[derive(Debug)]
pub struct ServerAuthority<S, K> {
    entity: EntityId,
    config: AuthorityConfig,
    simulator: S,
    sink: K,
    history: TickRing<StatePayload>,
    inbox: Inbox<InputPayload>,
    last_simulated: Tick,
    last_input: Option<InputPayload>,
    pending_override: Option<StateOverride>,
    stats: AuthorityStats,
}

impl<S: MovementSimulator, K: StateSink> ServerAuthority<S, K> {
    /// Creates an authority for `entity` spawned at `initial`.
    pub fn new(
        entity: EntityId,
        config: AuthorityConfig,
        simulator: S,
        sink: K,
        initial: StatePayload,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let history = TickRing::new(config.history_capacity).map_err(|_| {
            ConfigError::CapacityNotPowerOfTwo {
                capacity: config.history_capacity.get(),
            }
        })?;
        let mut authority = Self {
            entity,
            config,
            simulator,
            sink,
            history,
            inbox: Inbox::new(),
            last_simulated: initial.tick(),
            last_input: None,
            pending_override: None,
            stats: AuthorityStats::default(),
        };
        authority.reset(initial);
        Ok(authority)
    }

    /// Handle for delivering inputs from the network.
    #[must_use]
    pub fn input_sender(&self) -> InboxSender<InputPayload> {
        self.inbox.sender()
    }

    /// Queues an input for the next tick.
    pub fn receive_input(&self, input: InputPayload) {
        self.inbox.sender().push(input);
    }

    /// Schedules an override for the next simulated input.
    ///
    /// A later call before that input replaces the earlier override.
    pub fn schedule_override(&mut self, state_override: StateOverride) {
        self.pending_override = Some(state_override);
    }

    /// Runs one authoritative tick.
    pub fn tick(&mut self) -> AuthorityTick {
        let mut inputs = self.inbox.drain();
        inputs.sort_by_key(InputPayload::tick);

        let mut report = AuthorityTick::default();
        let mut previous: Option<Tick> = None;
        let mut produced = None;
        for input in inputs {
            let tick = input.tick();
            if previous == Some(tick) {
                self.stats.duplicates += 1;
                report.rejected += 1;
                debug!(entity = self.entity.raw(), tick = tick.raw(), "duplicate input");
                continue;
            }
            previous = Some(tick);
            if tick <= self.last_simulated {
                self.stats.stale += 1;
                report.rejected += 1;
                debug!(
                    entity = self.entity.raw(),
                    tick = tick.raw(),
                    last_simulated = self.last_simulated.raw(),
                    "stale input"
                );
                continue;
            }

            report.applied += self.handle_gap(tick);
            produced = Some(self.apply(&input));
            report.applied += 1;
        }

        if let Some(state) = produced {
            self.sink.send_state(self.entity, &state);
            self.stats.broadcasts += 1;
            report.broadcast = Some(state);
        }
        report
    }

    /// Accounts for ticks between the last simulated tick and `tick`.
    /// Returns the number of filled ticks.
    fn handle_gap(&mut self, tick: Tick) -> usize {
        let missing = tick.since(self.last_simulated).saturating_sub(1);
        if missing == 0 {
            return 0;
        }
        let fill = match (self.config.gap_policy, self.last_input) {
            (GapPolicy::RepeatLast, Some(last)) => last,
            _ => {
                self.stats.gaps_skipped += missing;
                debug!(
                    entity = self.entity.raw(),
                    from = self.last_simulated.next().raw(),
                    to = tick.raw() - 1,
                    "input gap skipped"
                );
                return 0;
            }
        };

        // Filling further back than the window would only be overwritten.
        let capacity = self.history.capacity() as u64;
        let first = if missing > capacity {
            self.stats.gaps_skipped += missing - capacity;
            Tick::new(tick.raw() - capacity)
        } else {
            self.last_simulated.next()
        };
        let mut filled = 0;
        let mut gap_tick = first;
        while gap_tick < tick {
            self.apply(&fill.restamped(gap_tick));
            gap_tick = gap_tick.next();
            filled += 1;
        }
        self.stats.gaps_filled += filled;
        debug!(
            entity = self.entity.raw(),
            from = first.raw(),
            to = tick.raw() - 1,
            "input gap filled"
        );
        usize::try_from(filled).unwrap_or(usize::MAX)
    }

    fn apply(&mut self, input: &InputPayload) -> StatePayload {
        let tick = input.tick();
        let prior = tick
            .prev()
            .and_then(|prev| self.history.get(prev))
            .or_else(|| self.history.newest().map(|(_, state)| state))
            .copied()
            .unwrap_or_else(|| StatePayload::new(self.last_simulated, Vec3::ZERO, Quat::IDENTITY));

        let mut state = self.simulator.simulate(&prior, input);
        if let Some(state_override) = self.pending_override.take() {
            state = state_override.apply(&state);
            debug!(entity = self.entity.raw(), tick = tick.raw(), "applied state override");
        }
        if let Err(err) = self.history.insert(tick, state) {
            warn!(entity = self.entity.raw(), tick = tick.raw(), %err, "state not stored");
        }
        self.last_simulated = tick;
        self.last_input = Some(*input);
        self.stats.applied += 1;
        state
    }

    /// Clears all history and pending input for a fresh spawn at `initial`.
    pub fn reset(&mut self, initial: StatePayload) {
        self.history.clear();
        self.inbox.clear();
        self.last_input = None;
        self.pending_override = None;
        self.last_simulated = initial.tick();
        if let Err(err) = self.history.insert(initial.tick(), initial) {
            warn!(entity = self.entity.raw(), %err, "spawn state not stored");
        }
        info!(
            entity = self.entity.raw(),
            tick = initial.tick().raw(),
            "authority spawned"
        );
    }

    /// Entity this authority simulates.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Newest tick the server has simulated.
    #[must_use]
    pub const fn last_simulated_tick(&self) -> Tick {
        self.last_simulated
    }

    /// Newest authoritative state.
    #[must_use]
    pub fn latest_state(&self) -> Option<StatePayload> {
        self.history.newest().map(|(_, state)| *state)
    }

    /// Authoritative state recorded for `tick`, if still buffered.
    #[must_use]
    pub fn state_at(&self, tick: Tick) -> Option<StatePayload> {
        self.history.get(tick).copied()
    }

    /// Counters since spawn.
    #[must_use]
    pub const fn stats(&self) -> &AuthorityStats {
        &self.stats
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Outbound broadcast sink.
    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutable access to the broadcast sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{LinearMovement, MovementConfig};
    use payload::Vec2;
    use timeline::TickRate;

    #[derive(Debug, Default)]
    struct RecordingSink {
        sent: Vec<StatePayload>,
    }

    impl StateSink for RecordingSink {
        fn send_state(&mut self, _entity: EntityId, state: &StatePayload) {
            self.sent.push(*state);
        }
    }

    fn state(tick: u64, x: f32) -> StatePayload {
        StatePayload::new(Tick::new(tick), Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
    }

    fn input(tick: u64) -> InputPayload {
        InputPayload::new(Tick::new(tick), Vec2::X, Quat::IDENTITY)
    }

    fn authority(policy: GapPolicy) -> ServerAuthority<LinearMovement, RecordingSink> {
        let config = AuthorityConfig {
            gap_policy: policy,
            ..AuthorityConfig::for_testing()
        };
        ServerAuthority::new(
            EntityId::new(1),
            config,
            LinearMovement::new(MovementConfig::new(TickRate::DEFAULT, 30.0)),
            RecordingSink::default(),
            state(0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn applies_out_of_order_inputs_in_tick_order() {
        let mut server = authority(GapPolicy::Skip);
        for tick in [3, 1, 2] {
            server.receive_input(input(tick));
        }
        let report = server.tick();
        assert_eq!(report.applied, 3);
        assert_eq!(report.broadcast, Some(state(3, 3.0)));
        assert_eq!(server.state_at(Tick::new(1)), Some(state(1, 1.0)));
        assert_eq!(server.state_at(Tick::new(2)), Some(state(2, 2.0)));
        assert_eq!(server.sink().sent, vec![state(3, 3.0)]);
    }

    #[test]
    fn rejects_duplicates_and_stale_inputs() {
        let mut server = authority(GapPolicy::Skip);
        server.receive_input(input(1));
        server.receive_input(input(1));
        let report = server.tick();
        assert_eq!(report.applied, 1);
        assert_eq!(report.rejected, 1);

        server.receive_input(input(1));
        let report = server.tick();
        assert_eq!(report.applied, 0);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.broadcast, None);
        assert_eq!(server.stats().duplicates, 1);
        assert_eq!(server.stats().stale, 1);
        assert_eq!(server.latest_state(), Some(state(1, 1.0)));
    }

    #[test]
    fn tick_without_input_sends_nothing() {
        let mut server = authority(GapPolicy::Skip);
        assert_eq!(server.tick(), AuthorityTick::default());
        assert!(server.sink().sent.is_empty());
    }

    #[test]
    fn skip_policy_simulates_from_latest_state() {
        let mut server = authority(GapPolicy::Skip);
        server.receive_input(input(1));
        server.receive_input(input(3));
        server.tick();

        assert_eq!(server.state_at(Tick::new(2)), None);
        assert_eq!(server.state_at(Tick::new(3)), Some(state(3, 2.0)));
        assert_eq!(server.stats().gaps_skipped, 1);
    }

    #[test]
    fn repeat_last_policy_fills_gap() {
        let mut server = authority(GapPolicy::RepeatLast);
        server.receive_input(input(1));
        server.tick();
        server.receive_input(input(4));
        let report = server.tick();

        assert_eq!(report.applied, 3);
        assert_eq!(server.state_at(Tick::new(2)), Some(state(2, 2.0)));
        assert_eq!(server.state_at(Tick::new(4)), Some(state(4, 4.0)));
        assert_eq!(server.stats().gaps_filled, 2);

        // The real input for a filled tick is now stale.
        server.receive_input(input(3));
        assert_eq!(server.tick().rejected, 1);
    }

    #[test]
    fn repeat_last_without_history_skips() {
        let mut server = authority(GapPolicy::RepeatLast);
        server.receive_input(input(3));
        server.tick();
        assert_eq!(server.stats().gaps_skipped, 2);
        assert_eq!(server.stats().gaps_filled, 0);
    }

    #[test]
    fn repeat_last_bounds_fill_to_window() {
        let mut server = authority(GapPolicy::RepeatLast);
        server.receive_input(input(1));
        server.tick();
        server.receive_input(input(1000));
        let report = server.tick();

        let capacity = AuthorityConfig::for_testing().history_capacity.get();
        assert_eq!(report.applied, capacity + 1);
        assert_eq!(server.last_simulated_tick(), Tick::new(1000));
    }

    #[test]
    fn override_applies_to_next_simulated_input() {
        let mut server = authority(GapPolicy::Skip);
        server.schedule_override(StateOverride::position(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(server.tick().broadcast, None);

        server.receive_input(input(1));
        server.receive_input(input(2));
        server.tick();
        assert_eq!(server.state_at(Tick::new(1)), Some(state(1, 10.0)));
        assert_eq!(server.state_at(Tick::new(2)), Some(state(2, 11.0)));
    }

    #[test]
    fn rotation_override_keeps_position() {
        let snap = Quat::from_rotation_y(1.5);
        let applied = StateOverride::rotation(snap).apply(&state(4, 2.0));
        assert_eq!(applied.position(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(applied.rotation(), snap);
        assert_eq!(applied.tick(), Tick::new(4));
    }

    #[test]
    fn reset_clears_history() {
        let mut server = authority(GapPolicy::Skip);
        server.receive_input(input(1));
        server.tick();
        server.receive_input(input(2));
        server.reset(state(50, -3.0));

        assert_eq!(server.last_simulated_tick(), Tick::new(50));
        assert_eq!(server.state_at(Tick::new(1)), None);
        assert_eq!(server.tick().applied, 0);
        assert_eq!(server.latest_state(), Some(state(50, -3.0)));
    }
}
