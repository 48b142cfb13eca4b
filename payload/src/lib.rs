//! Payloads exchanged between a predicting client and the authoritative server.
//!
//! Two messages cross the wire each tick in steady state:
//!
//! - [`InputPayload`] (client to server) - the controller intent for one tick
//! - [`StatePayload`] (server to client) - the simulated result of one tick
//!
//! Both are immutable once built. The tick field doubles as the sequence number.
//!
//! # Design Principles
//!
//! - **Immutable** - Fields are private; ring buffers hold copies.
//! - **Sanitised at the source** - [`InputPayload::new`] normalises intent once,
//!   so every later simulation of the same input sees identical bits.
//! - **No framing** - Byte layout lives in the `wire` crate.

mod input;
mod state;
mod types;

pub use glam::{Quat, Vec2, Vec3};
pub use input::{InputPayload, MotionCurveSample};
pub use state::StatePayload;
pub use timeline::Tick;
pub use types::EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = EntityId::new(1);
        let _ = InputPayload::new(Tick::ZERO, Vec2::ZERO, Quat::IDENTITY);
        let _ = StatePayload::new(Tick::ZERO, Vec3::ZERO, Quat::IDENTITY);
        let _ = MotionCurveSample::new(0.0, Vec3::ZERO);
    }
}
