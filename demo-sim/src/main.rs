mod link;

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver};
use payload::{EntityId, MotionCurveSample, Quat, StatePayload, Tick, Vec2, Vec3};
use predict::{
    decode_input_packet, decode_state_for, AuthorityConfig, ClientPredictor, ControllerIntent,
    CorrectionSeverity, EncodedSink, LinearMovement, MovementConfig, PredictionConfig,
    ReconcileOutcome, RemoteView, ServerAuthority, StateOverride,
};
use serde::Serialize;
use timeline::TickRate;
use tracing::{info, warn};
use wire::Limits;

use crate::link::{LinkConfig, LinkStats, LossyLink, Rng};

const ENTITY: EntityId = EntityId::new(1);

#[derive(Parser)]
#[command(
    name = "demo-sim",
    version,
    about = "Deterministic client/server prediction run over a lossy link"
)]
struct Cli {
    /// Ticks with player input.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Idle ticks after input stops, for the link to drain.
    #[arg(long, default_value_t = 60)]
    settle_ticks: u32,
    /// Simulation rate in Hz.
    #[arg(long, default_value_t = 30)]
    tick_rate: u32,
    /// One-way latency in ticks.
    #[arg(long, default_value_t = 3)]
    latency: u32,
    /// Extra random delay in ticks, per packet.
    #[arg(long, default_value_t = 2)]
    jitter: u32,
    /// Packet loss probability, per packet.
    #[arg(long, default_value_t = 0.05)]
    loss: f64,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// History capacity in ticks. Must be a power of two.
    #[arg(long, default_value_t = 1024)]
    capacity: usize,
    /// Movement speed in units per second.
    #[arg(long, default_value_t = 6.0)]
    speed: f32,
    /// Server knockback cadence in ticks.
    #[arg(long)]
    knockback_every: Option<u32>,
    /// Write the JSON summary here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fail if client and server end further apart than this.
    #[arg(long)]
    max_final_error: Option<f32>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let tick_rate = TickRate::new(cli.tick_rate).context("tick rate must be non-zero")?;
    let capacity = NonZeroUsize::new(cli.capacity).context("capacity must be non-zero")?;
    let link_config = LinkConfig {
        latency_ticks: cli.latency,
        jitter_ticks: cli.jitter,
        loss: cli.loss,
    };
    anyhow::ensure!(
        (0.0..=1.0).contains(&link_config.loss),
        "loss must be within [0, 1], got {}",
        link_config.loss
    );

    let prediction = PredictionConfig {
        history_capacity: capacity,
        tick_rate,
        ..PredictionConfig::default()
    };
    let authority = AuthorityConfig {
        history_capacity: capacity,
        ..AuthorityConfig::default()
    };
    let simulator = LinearMovement::new(MovementConfig::new(tick_rate, cli.speed));
    let spawn = StatePayload::new(Tick::ZERO, Vec3::ZERO, Quat::IDENTITY);
    let limits = Limits::default();

    let (uplink_tx, uplink_rx) = unbounded();
    let (peers_tx, peers_rx) = unbounded();
    let (downlink_tx, downlink_rx) = unbounded();

    let mut client = ClientPredictor::new(
        ENTITY,
        prediction.clone(),
        simulator,
        EncodedSink::new(uplink_tx).with_peer_broadcast(peers_tx),
        spawn,
    )
    .context("build client predictor")?;
    let mut server = ServerAuthority::new(
        ENTITY,
        authority,
        simulator,
        EncodedSink::new(downlink_tx),
        spawn,
    )
    .context("build server authority")?;
    let mut observer = RemoteView::new(ENTITY, capacity).context("build remote view")?;
    observer.receive_state(spawn);

    let mut rng = Rng::new(cli.seed);
    let mut uplink = LossyLink::new(link_config, Rng::new(cli.seed ^ 0x5550));
    let mut downlink = LossyLink::new(link_config, Rng::new(cli.seed ^ 0x444F));
    let mut wander = Wander::new(&mut rng);
    let mut summary = Summary::new(&cli, link_config);

    info!(
        ticks = cli.ticks,
        tick_rate = cli.tick_rate,
        latency = cli.latency,
        jitter = cli.jitter,
        loss = cli.loss,
        seed = cli.seed,
        "starting run"
    );

    let total = u64::from(cli.ticks) + u64::from(cli.settle_ticks);
    for step in 0..total {
        let intent = if step < u64::from(cli.ticks) {
            wander.intent(&mut rng, step)
        } else {
            ControllerIntent::idle()
        };
        let report = client.tick(&intent).context("client tick")?;
        summary.record(&report.reconcile);

        for bytes in drain(&uplink_rx) {
            uplink.send(step, bytes);
        }
        for bytes in uplink.deliver(step) {
            let (entity, input) =
                decode_input_packet(&bytes, &limits).context("decode input packet")?;
            anyhow::ensure!(entity == ENTITY, "input for unknown entity {}", entity.raw());
            server.receive_input(input);
        }
        for bytes in drain(&peers_rx) {
            let (_, input) = decode_input_packet(&bytes, &limits).context("decode peer input")?;
            observer.receive_input(input);
        }

        if let (Some(every), Some(latest)) = (cli.knockback_every, server.latest_state()) {
            if every > 0 && step > 0 && step < u64::from(cli.ticks) && step % u64::from(every) == 0
            {
                let shove = Vec3::new(0.0, 0.0, 2.0);
                server.schedule_override(StateOverride::position(latest.position() + shove));
                summary.knockbacks += 1;
            }
        }
        server.tick();

        for bytes in drain(&downlink_rx) {
            downlink.send(step, bytes);
        }
        for bytes in downlink.deliver(step) {
            let state =
                decode_state_for(&bytes, &limits, ENTITY).context("decode state packet")?;
            client.receive_state(state);
            observer.receive_state(state);
        }
    }
    // Fold in whatever arrived on the last step.
    client.tick(&ControllerIntent::idle()).context("final client tick")?;

    let authoritative = server
        .latest_state()
        .context("server has no authoritative state")?;
    let predicted = client.latest_state().context("client has no state")?;
    summary.final_error = predicted.distance_to(&authoritative);
    summary.observer_error = observer
        .display_state(&simulator)
        .map(|view| view.distance_to(&authoritative));
    summary.in_flight = uplink.in_flight() + downlink.in_flight();
    summary.uplink = uplink.stats();
    summary.downlink = downlink.stats();
    let stats = server.stats();
    summary.server_applied = stats.applied;
    summary.server_stale = stats.stale;
    summary.server_duplicates = stats.duplicates;
    summary.server_gaps_skipped = stats.gaps_skipped;
    summary.converged = summary.final_error <= prediction.correction_epsilon;

    if summary.converged {
        info!(final_error = summary.final_error, "client and server converged");
    } else {
        warn!(final_error = summary.final_error, "client and server did not converge");
    }

    write_summary(cli.out.as_deref(), &summary)?;
    summary.assert_budgets(cli.max_final_error)
}

fn drain(rx: &Receiver<Vec<u8>>) -> Vec<Vec<u8>> {
    rx.try_iter().collect()
}

fn write_summary(out: Option<&Path>, summary: &Summary) -> Result<()> {
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    match out {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("write {}", path.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

/// Random walk: holds a heading for a while, then picks another.
/// Every so often the input carries a dash from the motion curve.
struct Wander {
    heading: f32,
    hold: u64,
}

impl Wander {
    const DASH_EVERY: u64 = 45;

    fn new(rng: &mut Rng) -> Self {
        Self {
            heading: Self::pick_heading(rng),
            hold: 0,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn pick_heading(rng: &mut Rng) -> f32 {
        (rng.unit() * std::f64::consts::TAU) as f32
    }

    fn intent(&mut self, rng: &mut Rng, step: u64) -> ControllerIntent {
        if self.hold == 0 {
            self.heading = Self::pick_heading(rng);
            self.hold = 10 + u64::from(rng.up_to(40));
        }
        self.hold -= 1;

        let movement = Vec2::from_angle(self.heading);
        let facing = Quat::from_rotation_y(self.heading);
        let intent = ControllerIntent::new(movement, facing);
        if step % Self::DASH_EVERY == 0 {
            let dash = Vec3::new(movement.x, 0.0, movement.y) * 0.25;
            intent.with_motion_curve(MotionCurveSample::new(0.5, dash))
        } else {
            intent
        }
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    ticks: u32,
    settle_ticks: u32,
    tick_rate: u32,
    seed: u64,
    link: LinkConfig,
    agreed: u64,
    corrected_smooth: u64,
    corrected_snap: u64,
    expired: u64,
    ahead: u64,
    max_correction_error: f32,
    knockbacks: u64,
    server_applied: u64,
    server_stale: u64,
    server_duplicates: u64,
    server_gaps_skipped: u64,
    uplink: LinkStats,
    downlink: LinkStats,
    in_flight: usize,
    final_error: f32,
    observer_error: Option<f32>,
    converged: bool,
}

impl Summary {
    fn new(cli: &Cli, link: LinkConfig) -> Self {
        Self {
            ticks: cli.ticks,
            settle_ticks: cli.settle_ticks,
            tick_rate: cli.tick_rate,
            seed: cli.seed,
            link,
            agreed: 0,
            corrected_smooth: 0,
            corrected_snap: 0,
            expired: 0,
            ahead: 0,
            max_correction_error: 0.0,
            knockbacks: 0,
            server_applied: 0,
            server_stale: 0,
            server_duplicates: 0,
            server_gaps_skipped: 0,
            uplink: LinkStats::default(),
            downlink: LinkStats::default(),
            in_flight: 0,
            final_error: 0.0,
            observer_error: None,
            converged: false,
        }
    }

    fn record(&mut self, outcome: &ReconcileOutcome) {
        match *outcome {
            ReconcileOutcome::Idle => {}
            ReconcileOutcome::Agreed { .. } => self.agreed += 1,
            ReconcileOutcome::Ahead { .. } => self.ahead += 1,
            ReconcileOutcome::Expired { .. } => self.expired += 1,
            ReconcileOutcome::Corrected {
                error, severity, ..
            } => {
                match severity {
                    CorrectionSeverity::Smooth => self.corrected_smooth += 1,
                    CorrectionSeverity::Snap => self.corrected_snap += 1,
                }
                self.max_correction_error = self.max_correction_error.max(error);
            }
        }
    }

    fn assert_budgets(&self, max_final_error: Option<f32>) -> Result<()> {
        if let Some(max_final_error) = max_final_error {
            if self.final_error > max_final_error {
                anyhow::bail!(
                    "final error {} exceeds budget {}",
                    self.final_error,
                    max_final_error
                );
            }
        }
        Ok(())
    }
}
