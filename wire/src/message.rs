//! Encoding and decoding of the two payload messages.

use payload::{EntityId, InputPayload, MotionCurveSample, StatePayload, Tick};

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{EncodeError, WireResult};
use crate::header::{decode_header, encode_header, MessageKind, PacketHeader, HEADER_SIZE};
use crate::limits::Limits;

/// A decoded message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireMessage {
    /// Client to server.
    Input {
        entity: EntityId,
        input: InputPayload,
    },
    /// Server to client.
    State {
        entity: EntityId,
        state: StatePayload,
    },
}

impl WireMessage {
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::Input { entity, .. } | Self::State { entity, .. } => *entity,
        }
    }

    #[must_use]
    pub const fn tick(&self) -> Tick {
        match self {
            Self::Input { input, .. } => input.tick(),
            Self::State { state, .. } => state.tick(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Input { .. } => MessageKind::Input,
            Self::State { .. } => MessageKind::State,
        }
    }
}

/// Returns the encoded size of an input message.
#[must_use]
pub const fn input_encoded_len(input: &InputPayload) -> usize {
    HEADER_SIZE
        + PacketHeader::input(EntityId::new(0), Tick::ZERO, input.motion_curve().is_some())
            .expected_body_len()
}

/// Encodes an input message into the provided output buffer.
///
/// Returns the number of bytes written.
pub fn encode_input(
    entity: EntityId,
    input: &InputPayload,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let curve = input.motion_curve();
    let header = PacketHeader::input(entity, input.tick(), curve.is_some());
    let needed = HEADER_SIZE + header.expected_body_len();
    if out.len() < needed {
        return Err(EncodeError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    let offset = encode_header(&header, out)?;
    let mut writer = ByteWriter::new(&mut out[offset..]);
    writer.write_vec2(input.movement(), "movement")?;
    writer.write_quat(input.facing(), "facing")?;
    if let Some(sample) = curve {
        writer.write_f32(sample.phase(), "motion_curve.phase")?;
        writer.write_vec3(sample.displacement(), "motion_curve.displacement")?;
    }
    Ok(offset + writer.position())
}

/// Encodes a state message into the provided output buffer.
///
/// Returns the number of bytes written.
pub fn encode_state(
    entity: EntityId,
    state: &StatePayload,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let header = PacketHeader::state(entity, state.tick());
    let needed = HEADER_SIZE + header.expected_body_len();
    if out.len() < needed {
        return Err(EncodeError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    let offset = encode_header(&header, out)?;
    let mut writer = ByteWriter::new(&mut out[offset..]);
    writer.write_vec3(state.position(), "position")?;
    writer.write_quat(state.rotation(), "rotation")?;
    Ok(offset + writer.position())
}

/// Encodes any message into the provided output buffer.
pub fn encode_message(message: &WireMessage, out: &mut [u8]) -> Result<usize, EncodeError> {
    match message {
        WireMessage::Input { entity, input } => encode_input(*entity, input, out),
        WireMessage::State { entity, state } => encode_state(*entity, state, out),
    }
}

/// Decodes one message.
///
/// Float fields are taken verbatim so the receiver simulates exactly what the
/// sender produced; NaN and infinity are rejected.
pub fn decode_message(buf: &[u8], limits: &Limits) -> WireResult<WireMessage> {
    let header = decode_header(buf, limits)?;
    let mut reader = ByteReader::new(&buf[HEADER_SIZE..]);

    match header.kind {
        MessageKind::Input => {
            let movement = reader.read_vec2("movement")?;
            let facing = reader.read_quat("facing")?;
            let curve = if header.flags.has_motion_curve() {
                let phase = reader.read_f32("motion_curve.phase")?;
                let displacement = reader.read_vec3("motion_curve.displacement")?;
                Some(MotionCurveSample::from_raw(phase, displacement))
            } else {
                None
            };
            Ok(WireMessage::Input {
                entity: header.entity,
                input: InputPayload::from_raw(header.tick, movement, facing, curve),
            })
        }
        MessageKind::State => {
            let position = reader.read_vec3("position")?;
            let rotation = reader.read_quat("rotation")?;
            Ok(WireMessage::State {
                entity: header.entity,
                state: StatePayload::new(header.tick, position, rotation),
            })
        }
    }
}
