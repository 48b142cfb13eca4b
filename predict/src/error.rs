//! Error types for the prediction engine.

use std::fmt;

use payload::EntityId;
use timeline::RingError;
use wire::{DecodeError, MessageKind};

/// Result type for predictor operations.
pub type PredictResult<T> = Result<T, PredictError>;

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// History capacity must be a power of two for mask indexing.
    CapacityNotPowerOfTwo { capacity: usize },
    /// Correction epsilon must be finite and non-negative.
    InvalidEpsilon { value: f32 },
    /// Snap threshold must be finite and larger than the epsilon.
    InvalidSnapThreshold { value: f32, epsilon: f32 },
    /// The simulator scales movement for a different rate than the clock runs at.
    TickRateMismatch { clock: u32, simulator: u32 },
}

/// Errors from driving a [`ClientPredictor`](crate::ClientPredictor).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PredictError {
    /// The predictor was disconnected and has not been spawned again.
    NotSpawned,
    /// A history write fell outside the retained window.
    History(RingError),
}

/// A packet that must not reach the simulator.
///
/// Callers treat this as fatal to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PacketError {
    /// The bytes are not a well-formed message.
    Decode(DecodeError),
    /// A well-formed message of the other kind.
    UnexpectedKind {
        expected: MessageKind,
        found: MessageKind,
    },
    /// A well-formed message for an entity this endpoint does not own.
    UnexpectedEntity { expected: EntityId, found: EntityId },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityNotPowerOfTwo { capacity } => {
                write!(f, "history capacity {capacity} is not a power of two")
            }
            Self::InvalidEpsilon { value } => {
                write!(f, "correction epsilon {value} must be finite and >= 0")
            }
            Self::InvalidSnapThreshold { value, epsilon } => {
                write!(
                    f,
                    "snap threshold {value} must be finite and greater than epsilon {epsilon}"
                )
            }
            Self::TickRateMismatch { clock, simulator } => {
                write!(f, "clock runs at {clock} Hz but simulator expects {simulator} Hz")
            }
        }
    }
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSpawned => write!(f, "predictor is not spawned"),
            Self::History(err) => write!(f, "history error: {err}"),
        }
    }
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "malformed packet: {err}"),
            Self::UnexpectedKind { expected, found } => {
                write!(f, "expected {expected:?} message, got {found:?}")
            }
            Self::UnexpectedEntity { expected, found } => {
                write!(
                    f,
                    "message for entity {} on a connection for entity {}",
                    found.raw(),
                    expected.raw()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for PredictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::History(err) => Some(err),
            Self::NotSpawned => None,
        }
    }
}

impl std::error::Error for PacketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::UnexpectedKind { .. } | Self::UnexpectedEntity { .. } => None,
        }
    }
}

impl From<RingError> for PredictError {
    fn from(err: RingError) -> Self {
        Self::History(err)
    }
}

impl From<DecodeError> for PacketError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}
