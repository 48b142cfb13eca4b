//! The client-side predictor.

use payload::{EntityId, StatePayload};
use timeline::Tick;
use tracing::{debug, info, trace, warn};

use crate::config::PredictionConfig;
use crate::error::{ConfigError, PredictError, PredictResult};
use crate::history::PredictionHistory;
use crate::reconcile::{CorrectionSeverity, ReconcileOutcome, ReconcilePhase, ReconciliationEngine};
use crate::sampler::{ControllerIntent, InputSampler};
use crate::simulator::MovementSimulator;
use crate::smoothing::SmoothCorrection;
use crate::transport::{Inbox, InboxSender, InputSink};

/// Summary of one predicted tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Tick just predicted.
    pub tick: Tick,
    /// State predicted for `tick`.
    pub predicted: StatePayload,
    /// What reconciliation did before predicting.
    pub reconcile: ReconcileOutcome,
}

/// Predicts the locally controlled entity ahead of the server.
///
/// Each [`tick`](Self::tick) first folds in any authoritative state that has
/// arrived, then samples input, simulates it from the previous predicted
/// state, records both, and sends the input. The state history is what the
/// render layer reads.
#[derive(Debug)]
pub struct ClientPredictor<S, K> {
    entity: EntityId,
    config: PredictionConfig,
    simulator: S,
    sink: K,
    sampler: InputSampler,
    history: PredictionHistory,
    reconciler: ReconciliationEngine,
    smoothing: SmoothCorrection,
    inbox: Inbox<StatePayload>,
    spawned: bool,
}

impl<S: MovementSimulator, K: InputSink> ClientPredictor<S, K> {
    /// Spawns a predictor at `initial`, the authoritative spawn state.
    pub fn new(
        entity: EntityId,
        config: PredictionConfig,
        simulator: S,
        sink: K,
        initial: StatePayload,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if let Some(rate) = simulator.tick_rate() {
            if rate != config.tick_rate {
                return Err(ConfigError::TickRateMismatch {
                    clock: config.tick_rate.hz(),
                    simulator: rate.hz(),
                });
            }
        }
        let history = PredictionHistory::new(config.history_capacity).map_err(|_| {
            ConfigError::CapacityNotPowerOfTwo {
                capacity: config.history_capacity.get(),
            }
        })?;
        let mut predictor = Self {
            entity,
            sampler: InputSampler::new(initial.tick(), config.tick_rate),
            reconciler: ReconciliationEngine::new(config.correction_epsilon, config.snap_threshold),
            smoothing: SmoothCorrection::new(config.smoothing_ticks),
            config,
            simulator,
            sink,
            history,
            inbox: Inbox::new(),
            spawned: false,
        };
        predictor.start_session(initial);
        Ok(predictor)
    }

    /// Handle for delivering authoritative states from the network.
    #[must_use]
    pub fn state_sender(&self) -> InboxSender<StatePayload> {
        self.inbox.sender()
    }

    /// Queues an authoritative state for the next tick.
    pub fn receive_state(&self, state: StatePayload) {
        self.inbox.sender().push(state);
    }

    /// Runs one local tick.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::NotSpawned`] after [`disconnect`](Self::disconnect).
    pub fn tick(&mut self, intent: &ControllerIntent) -> PredictResult<TickReport> {
        if !self.spawned {
            return Err(PredictError::NotSpawned);
        }
        let reconcile = self.poll_reconcile();

        let input = self.sampler.sample(intent);
        let tick = input.tick();
        let prior = self
            .history
            .prior_state(tick)
            .copied()
            .ok_or(PredictError::NotSpawned)?;
        let predicted = self.simulator.simulate(&prior, &input);
        self.history.record_input(input)?;
        self.history.record_state(predicted)?;

        self.sink.send_input(self.entity, &input);
        self.sink.broadcast_input(self.entity, &input);
        self.smoothing.step();

        Ok(TickReport {
            tick,
            predicted,
            reconcile,
        })
    }

    fn poll_reconcile(&mut self) -> ReconcileOutcome {
        for state in self.inbox.drain() {
            self.reconciler.receive(state);
        }
        let before = self.history.latest_state().copied();
        let current = self.sampler.current_tick();
        let outcome = self
            .reconciler
            .reconcile(&mut self.history, &self.simulator, current);
        let entity = self.entity.raw();

        match outcome {
            ReconcileOutcome::Idle => {}
            ReconcileOutcome::Agreed { tick, error } => {
                trace!(entity, tick = tick.raw(), error, "prediction agreed");
            }
            ReconcileOutcome::Ahead { tick, current } => {
                debug!(
                    entity,
                    tick = tick.raw(),
                    current = current.raw(),
                    "authoritative state ahead of prediction"
                );
            }
            ReconcileOutcome::Expired { tick } => {
                warn!(
                    entity,
                    tick = tick.raw(),
                    capacity = self.history.capacity(),
                    "correction outside history window"
                );
            }
            ReconcileOutcome::Corrected {
                tick,
                error,
                replayed,
                severity: CorrectionSeverity::Smooth,
            } => {
                debug!(entity, tick = tick.raw(), error, replayed, "corrected prediction");
                if let (Some(before), Some(after)) = (before, self.history.latest_state()) {
                    self.smoothing.start(before.position() - after.position());
                }
            }
            ReconcileOutcome::Corrected {
                tick,
                error,
                replayed,
                severity: CorrectionSeverity::Snap,
            } => {
                warn!(
                    entity,
                    tick = tick.raw(),
                    error,
                    replayed,
                    threshold = self.config.snap_threshold,
                    "prediction desync, snapping to authoritative state"
                );
                self.smoothing.clear();
            }
        }
        outcome
    }

    /// Clears all session state. `tick` fails until [`spawn`](Self::spawn).
    pub fn disconnect(&mut self) {
        self.clear_session();
        self.spawned = false;
        info!(entity = self.entity.raw(), "predictor disconnected");
    }

    /// Starts a fresh session at `initial`, discarding any previous one.
    pub fn spawn(&mut self, initial: StatePayload) {
        self.clear_session();
        self.start_session(initial);
    }

    fn clear_session(&mut self) {
        self.history.clear();
        self.reconciler.reset();
        self.inbox.clear();
        self.smoothing.clear();
    }

    fn start_session(&mut self, initial: StatePayload) {
        self.sampler.reset(initial.tick());
        // The rings are empty here, so the write is always inside the window.
        self.spawned = self.history.record_state(initial).is_ok();
        info!(
            entity = self.entity.raw(),
            tick = initial.tick().raw(),
            "predictor spawned"
        );
    }

    /// Entity this predictor drives.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Whether a spawn state has been applied.
    #[must_use]
    pub const fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// Newest predicted tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.sampler.current_tick()
    }

    /// Newest predicted state, as the simulation sees it.
    #[must_use]
    pub fn latest_state(&self) -> Option<StatePayload> {
        self.history.latest_state().copied()
    }

    /// Newest predicted state with the visual correction offset applied.
    #[must_use]
    pub fn render_state(&self) -> Option<StatePayload> {
        self.history.latest_state().map(|state| {
            StatePayload::new(
                state.tick(),
                state.position() + self.smoothing.offset(),
                state.rotation(),
            )
        })
    }

    /// Buffered inputs and predicted states.
    #[must_use]
    pub const fn history(&self) -> &PredictionHistory {
        &self.history
    }

    /// Where reconciliation stands.
    #[must_use]
    pub fn reconcile_phase(&self) -> ReconcilePhase {
        self.reconciler.phase()
    }

    /// Authoritative bookkeeping.
    #[must_use]
    pub const fn reconciler(&self) -> &ReconciliationEngine {
        &self.reconciler
    }

    /// Pending visual correction.
    #[must_use]
    pub const fn smoothing(&self) -> &SmoothCorrection {
        &self.smoothing
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Outbound input sink.
    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutable access to the input sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{LinearMovement, MovementConfig};
    use crate::transport::NullSink;
    use payload::{InputPayload, Quat, Vec2, Vec3};
    use std::num::NonZeroUsize;
    use timeline::TickRate;

    #[derive(Debug, Default)]
    struct RecordingSink {
        sent: Vec<InputPayload>,
        broadcast: Vec<InputPayload>,
    }

    impl InputSink for RecordingSink {
        fn send_input(&mut self, _entity: EntityId, input: &InputPayload) {
            self.sent.push(*input);
        }

        fn broadcast_input(&mut self, _entity: EntityId, input: &InputPayload) {
            self.broadcast.push(*input);
        }
    }

    fn sim() -> LinearMovement {
        LinearMovement::new(MovementConfig::new(TickRate::DEFAULT, 30.0))
    }

    fn state(tick: u64, x: f32) -> StatePayload {
        StatePayload::new(Tick::new(tick), Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
    }

    fn forward() -> ControllerIntent {
        ControllerIntent::new(Vec2::X, Quat::IDENTITY)
    }

    fn predictor<K: InputSink>(sink: K) -> ClientPredictor<LinearMovement, K> {
        ClientPredictor::new(
            EntityId::new(1),
            PredictionConfig::for_testing(),
            sim(),
            sink,
            state(0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = PredictionConfig {
            history_capacity: NonZeroUsize::new(100).unwrap(),
            ..PredictionConfig::for_testing()
        };
        let result = ClientPredictor::new(EntityId::new(1), config, sim(), NullSink, state(0, 0.0));
        assert!(matches!(
            result,
            Err(ConfigError::CapacityNotPowerOfTwo { capacity: 100 })
        ));
    }

    #[test]
    fn new_rejects_simulator_at_another_rate() {
        let fast = LinearMovement::new(MovementConfig::new(TickRate::new(60).unwrap(), 30.0));
        let result = ClientPredictor::new(
            EntityId::new(1),
            PredictionConfig::for_testing(),
            fast,
            NullSink,
            state(0, 0.0),
        );
        assert!(matches!(
            result,
            Err(ConfigError::TickRateMismatch {
                clock: 30,
                simulator: 60
            })
        ));
    }

    #[test]
    fn tick_predicts_records_and_sends() {
        let mut predictor = predictor(RecordingSink::default());
        let report = predictor.tick(&forward()).unwrap();

        assert_eq!(report.tick, Tick::new(1));
        assert_eq!(report.predicted, state(1, 1.0));
        assert_eq!(report.reconcile, ReconcileOutcome::Idle);
        assert_eq!(predictor.latest_state(), Some(state(1, 1.0)));
        assert!(predictor.history().input_at(Tick::new(1)).is_some());
        assert_eq!(predictor.sink().sent.len(), 1);
        assert_eq!(predictor.sink().broadcast.len(), 1);
    }

    #[test]
    fn agreeing_state_keeps_history() {
        let mut predictor = predictor(NullSink);
        for _ in 0..5 {
            predictor.tick(&forward()).unwrap();
        }
        predictor.receive_state(state(3, 3.0));
        let report = predictor.tick(&forward()).unwrap();
        assert!(matches!(report.reconcile, ReconcileOutcome::Agreed { .. }));
        assert_eq!(report.predicted, state(6, 6.0));
        assert_eq!(predictor.reconcile_phase(), ReconcilePhase::Idle);
    }

    #[test]
    fn smooth_correction_offsets_render_only() {
        let mut predictor = predictor(NullSink);
        for _ in 0..5 {
            predictor.tick(&forward()).unwrap();
        }
        predictor.receive_state(state(3, 2.0));
        let report = predictor.tick(&forward()).unwrap();

        assert!(matches!(
            report.reconcile,
            ReconcileOutcome::Corrected {
                severity: CorrectionSeverity::Smooth,
                replayed: 2,
                ..
            }
        ));
        assert_eq!(predictor.latest_state(), Some(state(6, 5.0)));

        let rendered = predictor.render_state().unwrap();
        assert!(rendered.position().x > 5.0);
        assert!(rendered.position().x < 6.0);

        for _ in 0..PredictionConfig::for_testing().smoothing_ticks {
            predictor.tick(&forward()).unwrap();
        }
        assert!(predictor.smoothing().is_complete());
        assert_eq!(predictor.render_state(), predictor.latest_state());
    }

    #[test]
    fn back_to_back_corrections_keep_drawn_position() {
        let mut predictor = predictor(NullSink);
        for _ in 0..5 {
            predictor.tick(&forward()).unwrap();
        }
        predictor.receive_state(state(3, 2.0));
        predictor.tick(&forward()).unwrap();
        assert!(!predictor.smoothing().is_complete());

        predictor.receive_state(state(5, 3.0));
        let drawn = predictor.render_state().unwrap();
        let outcome = predictor.poll_reconcile();
        assert!(matches!(
            outcome,
            ReconcileOutcome::Corrected {
                severity: CorrectionSeverity::Smooth,
                ..
            }
        ));
        assert_eq!(predictor.latest_state(), Some(state(6, 4.0)));

        let redrawn = predictor.render_state().unwrap();
        assert_eq!(redrawn.tick(), drawn.tick());
        let jump = (redrawn.position() - drawn.position()).length();
        assert!(jump < 1e-5, "drawn position jumped by {jump}");
    }

    #[test]
    fn snap_correction_clears_offset() {
        let mut predictor = predictor(NullSink);
        for _ in 0..5 {
            predictor.tick(&forward()).unwrap();
        }
        predictor.receive_state(state(3, 2.0));
        predictor.tick(&forward()).unwrap();
        assert!(!predictor.smoothing().is_complete());

        predictor.receive_state(state(5, 50.0));
        let report = predictor.tick(&forward()).unwrap();
        assert!(matches!(
            report.reconcile,
            ReconcileOutcome::Corrected {
                severity: CorrectionSeverity::Snap,
                ..
            }
        ));
        assert_eq!(predictor.smoothing().offset(), Vec3::ZERO);
        assert_eq!(predictor.render_state(), predictor.latest_state());
        assert_eq!(predictor.latest_state(), Some(state(7, 52.0)));
    }

    #[test]
    fn disconnect_clears_and_blocks_ticks() {
        let mut predictor = predictor(NullSink);
        predictor.tick(&forward()).unwrap();
        predictor.receive_state(state(1, 1.0));
        predictor.disconnect();

        assert!(!predictor.is_spawned());
        assert!(predictor.latest_state().is_none());
        assert_eq!(predictor.reconcile_phase(), ReconcilePhase::Uninitialized);
        assert_eq!(predictor.tick(&forward()), Err(PredictError::NotSpawned));
    }

    #[test]
    fn spawn_starts_fresh_session() {
        let mut predictor = predictor(NullSink);
        predictor.tick(&forward()).unwrap();
        predictor.disconnect();

        predictor.spawn(state(200, 10.0));
        assert!(predictor.is_spawned());
        assert_eq!(predictor.current_tick(), Tick::new(200));
        let report = predictor.tick(&forward()).unwrap();
        assert_eq!(report.predicted, state(201, 11.0));
        assert!(predictor.history().state_at(Tick::new(1)).is_none());
    }

    #[test]
    fn states_sent_before_disconnect_are_dropped() {
        let mut predictor = predictor(NullSink);
        let sender = predictor.state_sender();
        predictor.tick(&forward()).unwrap();
        sender.push(state(1, -100.0));
        predictor.disconnect();
        predictor.spawn(state(0, 0.0));

        let report = predictor.tick(&forward()).unwrap();
        assert_eq!(report.reconcile, ReconcileOutcome::Idle);
        assert_eq!(report.predicted, state(1, 1.0));
    }
}
