//! Client-side prediction and server reconciliation for fixed-tick movement.
//!
//! The client runs its own copy of the movement simulation so input feels
//! immediate, keeps every input and predicted state in tick-indexed rings,
//! and rewrites that history when the server's authoritative state disagrees.
//! Both sides run the same [`MovementSimulator`] over the same inputs, so a
//! replay from the authoritative state converges exactly.
//!
//! # Components
//!
//! - [`ClientPredictor`] - samples, predicts, transmits, reconciles
//! - [`ServerAuthority`] - applies inputs in tick order, broadcasts state
//! - [`ReconciliationEngine`] and [`replay`] - compare, overwrite, resimulate
//! - [`RemoteView`] - display-side prediction for entities owned by peers
//!
//! # Example
//!
//! ```
//! use payload::{EntityId, Quat, StatePayload, Tick, Vec2, Vec3};
//! use predict::{
//!     AuthorityConfig, ClientPredictor, ControllerIntent, LinearMovement, NullSink,
//!     PredictionConfig, ServerAuthority,
//! };
//!
//! let spawn = StatePayload::new(Tick::ZERO, Vec3::ZERO, Quat::IDENTITY);
//! let mut server = ServerAuthority::new(
//!     EntityId::new(1),
//!     AuthorityConfig::default(),
//!     LinearMovement::default(),
//!     NullSink,
//!     spawn,
//! )
//! .unwrap();
//! let mut client = ClientPredictor::new(
//!     EntityId::new(1),
//!     PredictionConfig::default(),
//!     LinearMovement::default(),
//!     server.input_sender(),
//!     spawn,
//! )
//! .unwrap();
//!
//! let report = client.tick(&ControllerIntent::new(Vec2::X, Quat::IDENTITY)).unwrap();
//! let applied = server.tick();
//! assert_eq!(applied.broadcast, Some(report.predicted));
//! ```

mod authority;
mod config;
mod error;
mod history;
mod observer;
mod predictor;
mod reconcile;
mod sampler;
mod simulator;
mod smoothing;
mod transport;

pub use authority::{AuthorityStats, AuthorityTick, ServerAuthority, StateOverride};
pub use config::{AuthorityConfig, GapPolicy, PredictionConfig};
pub use error::{ConfigError, PacketError, PredictError, PredictResult};
pub use history::PredictionHistory;
pub use observer::RemoteView;
pub use predictor::{ClientPredictor, TickReport};
pub use reconcile::{
    replay, CorrectionSeverity, ReconcileOutcome, ReconcilePhase, ReconciliationEngine,
};
pub use sampler::{ControllerIntent, InputSampler};
pub use simulator::{LinearMovement, MovementConfig, MovementSimulator};
pub use smoothing::SmoothCorrection;
pub use transport::{
    decode_input_packet, decode_state_for, decode_state_packet, EncodedSink, Inbox,
    InboxSender, InputSink, NullSink, StateSink,
};
