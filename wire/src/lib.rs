//! Wire framing for tickline input and state messages.
//!
//! This crate handles the binary wire format: a fixed header followed by a
//! fixed-layout body for one of the two payload kinds. It is a framing
//! format, not a transport; delivery and ordering belong to the caller.
//!
//! # Layout
//!
//! All integers and floats are little-endian.
//!
//! | field         | type | notes                               |
//! |---------------|------|-------------------------------------|
//! | `magic`       | u32  | `"TKLN"`                            |
//! | `version`     | u16  | [`VERSION`]                         |
//! | `kind`        | u8   | 1 = input, 2 = state                |
//! | `flags`       | u8   | bit 0 = motion curve; others zero   |
//! | `entity`      | u32  |                                     |
//! | `tick`        | u64  |                                     |
//! | `payload_len` | u16  | bytes after the header              |
//!
//! Input body: `movement.xy`, `facing.xyzw`, then `phase` and
//! `displacement.xyz` when the motion-curve flag is set. State body:
//! `position.xyz`, `rotation.xyzw`.
//!
//! # Design Principles
//!
//! - **Bounded decoding** - Packet size is checked against [`Limits`] before any field is read.
//! - **Bit-exact floats** - Decoding never renormalises; non-finite values are rejected.
//! - **No panics** - Every malformed input maps to a [`DecodeError`].

mod cursor;
mod error;
mod header;
mod limits;
mod message;

pub use error::{DecodeError, EncodeError, WireResult};
pub use header::{
    decode_header, encode_header, MessageFlags, MessageKind, PacketHeader, HEADER_SIZE,
    INPUT_BODY_LEN, INPUT_CURVE_BODY_LEN, MAGIC, MAX_MESSAGE_SIZE, STATE_BODY_LEN, VERSION,
};
pub use limits::Limits;
pub use message::{
    decode_message, encode_input, encode_message, encode_state, input_encoded_len, WireMessage,
};
