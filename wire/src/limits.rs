//! Configurable limits for bounded decoding.

/// Wire-level limits for message decoding.
///
/// A well-formed message is at most [`MAX_MESSAGE_SIZE`](crate::MAX_MESSAGE_SIZE)
/// bytes; the limit guards the decoder against oversized datagrams before any
/// field is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum packet size in bytes.
    pub max_packet_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // One unfragmented UDP datagram on a typical path.
            max_packet_bytes: 1200,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_packet_bytes: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_packet_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_MESSAGE_SIZE;

    #[test]
    fn default_limits_packet_bytes() {
        assert_eq!(Limits::default().max_packet_bytes, 1200);
    }

    #[test]
    fn testing_limits_fit_largest_message() {
        let limits = Limits::for_testing();
        assert!(limits.max_packet_bytes >= MAX_MESSAGE_SIZE);
        assert!(limits.max_packet_bytes < Limits::default().max_packet_bytes);
    }

    #[test]
    fn unlimited_limits() {
        assert_eq!(Limits::unlimited().max_packet_bytes, usize::MAX);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_packet_bytes, 64);
    }
}
