//! Message header types and constants.

use payload::{EntityId, Tick};

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{DecodeError, EncodeError, WireResult};
use crate::limits::Limits;

/// Magic number identifying tickline messages.
///
/// This value is fixed and must never change across versions.
pub const MAGIC: u32 = 0x544B_4C4E; // "TKLN" in ASCII

/// Current wire format version.
pub const VERSION: u16 = 1;

/// Header size in bytes (22 total).
pub const HEADER_SIZE: usize = 4 + 2 + 1 + 1 + 4 + 8 + 2;

/// Input body: movement (2 x f32) + facing (4 x f32).
pub const INPUT_BODY_LEN: usize = 8 + 16;

/// Input body with a motion-curve sample: phase (f32) + displacement (3 x f32).
pub const INPUT_CURVE_BODY_LEN: usize = INPUT_BODY_LEN + 4 + 12;

/// State body: position (3 x f32) + rotation (4 x f32).
pub const STATE_BODY_LEN: usize = 12 + 16;

/// Largest well-formed message.
pub const MAX_MESSAGE_SIZE: usize = HEADER_SIZE + INPUT_CURVE_BODY_LEN;

/// Message kind carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum MessageKind {
    /// Client to server: [`payload::InputPayload`].
    Input = 1,
    /// Server to client: [`payload::StatePayload`].
    State = 2,
}

impl MessageKind {
    /// Parses a message kind from a raw byte.
    pub const fn parse(raw: u8) -> Result<Self, DecodeError> {
        match raw {
            1 => Ok(Self::Input),
            2 => Ok(Self::State),
            found => Err(DecodeError::UnknownKind { found }),
        }
    }
}

/// Message flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageFlags(u8);

impl MessageFlags {
    /// Input carries a motion-curve sample.
    pub const HAS_MOTION_CURVE: u8 = 1 << 0;

    /// Reserved bits mask (must be zero in version 1).
    const RESERVED_MASK: u8 = !0b1;

    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn motion_curve() -> Self {
        Self(Self::HAS_MOTION_CURVE)
    }

    #[must_use]
    pub const fn has_motion_curve(self) -> bool {
        self.0 & Self::HAS_MOTION_CURVE != 0
    }

    /// Returns `true` if the flags are valid for `kind` in version 1.
    ///
    /// No reserved bits may be set, and only input messages may carry a
    /// motion curve.
    #[must_use]
    pub const fn is_valid_for(self, kind: MessageKind) -> bool {
        if self.0 & Self::RESERVED_MASK != 0 {
            return false;
        }
        match kind {
            MessageKind::Input => true,
            MessageKind::State => !self.has_motion_curve(),
        }
    }
}

/// Message header (version 1).
///
/// Carries every field after the magic number, which is validated during
/// decoding and not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Wire format version.
    pub version: u16,
    /// Message kind.
    pub kind: MessageKind,
    /// Message flags.
    pub flags: MessageFlags,
    /// Entity the payload belongs to.
    pub entity: EntityId,
    /// Tick of the payload; doubles as the sequence number.
    pub tick: Tick,
    /// Body length in bytes.
    pub payload_len: u16,
}

impl PacketHeader {
    /// Creates a header for an input message.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn input(entity: EntityId, tick: Tick, has_motion_curve: bool) -> Self {
        let (flags, len) = if has_motion_curve {
            (MessageFlags::motion_curve(), INPUT_CURVE_BODY_LEN)
        } else {
            (MessageFlags::empty(), INPUT_BODY_LEN)
        };
        Self {
            version: VERSION,
            kind: MessageKind::Input,
            flags,
            entity,
            tick,
            payload_len: len as u16,
        }
    }

    /// Creates a header for a state message.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn state(entity: EntityId, tick: Tick) -> Self {
        Self {
            version: VERSION,
            kind: MessageKind::State,
            flags: MessageFlags::empty(),
            entity,
            tick,
            payload_len: STATE_BODY_LEN as u16,
        }
    }

    /// Body length implied by the kind and flags.
    #[must_use]
    pub const fn expected_body_len(&self) -> usize {
        match self.kind {
            MessageKind::Input if self.flags.has_motion_curve() => INPUT_CURVE_BODY_LEN,
            MessageKind::Input => INPUT_BODY_LEN,
            MessageKind::State => STATE_BODY_LEN,
        }
    }
}

/// Encodes a header into the provided output buffer.
pub fn encode_header(header: &PacketHeader, out: &mut [u8]) -> Result<usize, EncodeError> {
    if out.len() < HEADER_SIZE {
        return Err(EncodeError::BufferTooSmall {
            needed: HEADER_SIZE,
            available: out.len(),
        });
    }
    let mut writer = ByteWriter::new(out);
    writer.write_u32(MAGIC)?;
    writer.write_u16(header.version)?;
    writer.write_u8(header.kind as u8)?;
    writer.write_u8(header.flags.raw())?;
    writer.write_u32(header.entity.raw())?;
    writer.write_u64(header.tick.raw())?;
    writer.write_u16(header.payload_len)?;
    Ok(writer.position())
}

/// Decodes and validates a header.
///
/// `buf` is the whole packet; the header's `payload_len` must account for
/// every byte after the header, and must equal the body size for the kind.
pub fn decode_header(buf: &[u8], limits: &Limits) -> WireResult<PacketHeader> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::PacketTooSmall {
            actual: buf.len(),
            required: HEADER_SIZE,
        });
    }
    if buf.len() > limits.max_packet_bytes {
        return Err(DecodeError::LimitsExceeded {
            limit: limits.max_packet_bytes,
            actual: buf.len(),
        });
    }

    let mut reader = ByteReader::new(buf);
    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let version = reader.read_u16()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    let kind_raw = reader.read_u8()?;
    let kind = MessageKind::parse(kind_raw)?;

    let flags_raw = reader.read_u8()?;
    let flags = MessageFlags::from_raw(flags_raw);
    if !flags.is_valid_for(kind) {
        return Err(DecodeError::InvalidFlags {
            flags: flags_raw,
            kind: kind_raw,
        });
    }

    let entity = EntityId::new(reader.read_u32()?);
    let tick = Tick::new(reader.read_u64()?);
    let payload_len = reader.read_u16()?;

    let actual_len = reader.remaining();
    if usize::from(payload_len) != actual_len {
        return Err(DecodeError::PayloadLengthMismatch {
            header_len: payload_len,
            actual_len,
        });
    }

    let header = PacketHeader {
        version,
        kind,
        flags,
        entity,
        tick,
        payload_len,
    };
    let expected = header.expected_body_len();
    if actual_len != expected {
        return Err(DecodeError::InvalidBodyLength {
            expected,
            actual: actual_len,
        });
    }
    Ok(header)
}
