//! Error types for wire format operations.

use std::fmt;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Decode errors for framed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Packet is too small to contain the required header.
    PacketTooSmall { actual: usize, required: usize },

    /// Invalid magic number in packet header.
    InvalidMagic { found: u32 },

    /// Unsupported wire version.
    UnsupportedVersion { found: u16 },

    /// Unknown message kind byte.
    UnknownKind { found: u8 },

    /// Reserved flag bits set, or a flag not allowed for the message kind.
    InvalidFlags { flags: u8, kind: u8 },

    /// Header payload length does not match the bytes after the header.
    PayloadLengthMismatch { header_len: u16, actual_len: usize },

    /// Payload length is not the fixed body size for the kind and flags.
    InvalidBodyLength { expected: usize, actual: usize },

    /// A read ran past the end of the buffer.
    Truncated { needed: usize, available: usize },

    /// A float field decoded to NaN or infinity.
    NonFinite { field: &'static str },

    /// Packet larger than the configured limit.
    LimitsExceeded { limit: usize, actual: usize },
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    BufferTooSmall { needed: usize, available: usize },
    /// The payload holds a value the decoder would reject.
    NonFinite { field: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PacketTooSmall { actual, required } => {
                write!(
                    f,
                    "packet too small: {actual} bytes, need at least {required}"
                )
            }
            Self::InvalidMagic { found } => {
                write!(f, "invalid magic number: 0x{found:08X}")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported wire version: {found}")
            }
            Self::UnknownKind { found } => write!(f, "unknown message kind: {found}"),
            Self::InvalidFlags { flags, kind } => {
                write!(f, "invalid flags 0x{flags:02X} for message kind {kind}")
            }
            Self::PayloadLengthMismatch {
                header_len,
                actual_len,
            } => {
                write!(
                    f,
                    "payload length mismatch: header {header_len} bytes but {actual_len} available"
                )
            }
            Self::InvalidBodyLength { expected, actual } => {
                write!(f, "invalid body length: expected {expected}, got {actual}")
            }
            Self::Truncated { needed, available } => {
                write!(f, "truncated: need {needed} bytes, have {available}")
            }
            Self::NonFinite { field } => write!(f, "non-finite value in {field}"),
            Self::LimitsExceeded { limit, actual } => {
                write!(f, "packet bytes limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small: need {needed}, have {available}")
            }
            Self::NonFinite { field } => write!(f, "cannot encode non-finite {field}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_invalid_magic() {
        let err = DecodeError::InvalidMagic { found: 0xDEAD_BEEF };
        assert!(err.to_string().contains("DEADBEEF"));
    }

    #[test]
    fn decode_error_display_limits_exceeded() {
        let err = DecodeError::LimitsExceeded {
            limit: 64,
            actual: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("limit exceeded"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn decode_error_display_non_finite() {
        let err = DecodeError::NonFinite { field: "position" };
        assert_eq!(err.to_string(), "non-finite value in position");
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::BufferTooSmall {
            needed: 10,
            available: 4,
        };
        assert!(err.to_string().contains("buffer too small"));
    }
}
