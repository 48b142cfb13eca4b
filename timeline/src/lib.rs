//! Tick bookkeeping for client prediction and server reconciliation.
//!
//! This crate provides the leaf types every other tickline crate keys on:
//!
//! - [`Tick`] - a 64-bit simulation step counter
//! - [`TickRate`] and [`TickClock`] - fixed-rate tick advancement
//! - [`TickRing`] - a fixed-capacity buffer indexed by `tick mod capacity`
//!
//! # Design Principles
//!
//! - **No aliasing** - Every slot remembers its tick and every read checks it.
//! - **Power-of-two capacity** - Slot selection is a mask, not a division.
//! - **No domain knowledge** - This crate knows nothing about inputs or states.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use timeline::{Tick, TickRing};
//!
//! let mut ring = TickRing::new(NonZeroUsize::new(4).unwrap()).unwrap();
//! for raw in 0..=4 {
//!     ring.insert(Tick::new(raw), raw * 10).unwrap();
//! }
//!
//! // Tick 4 landed in slot 0 and pushed tick 0 out.
//! assert_eq!(ring.get(Tick::new(4)), Some(&40));
//! assert_eq!(ring.get(Tick::new(0)), None);
//! ```

mod clock;
mod error;
mod ring;
mod tick;

pub use clock::{TickClock, TickRate};
pub use error::RingError;
pub use ring::{SlotLookup, TickRing};
pub use tick::Tick;

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn public_api_exports() {
        let _ = Tick::new(0);
        let _ = TickRate::DEFAULT;
        let _ = TickClock::new(Tick::ZERO, TickRate::DEFAULT);
        let _ = TickRing::<u8>::new(NonZeroUsize::new(8).unwrap());

        let _: Result<(), RingError> = Ok(());
    }

    #[test]
    fn doctest_example() {
        let mut ring = TickRing::new(NonZeroUsize::new(4).unwrap()).unwrap();
        for raw in 0..=4 {
            ring.insert(Tick::new(raw), raw * 10).unwrap();
        }
        assert_eq!(ring.get(Tick::new(4)), Some(&40));
        assert_eq!(ring.get(Tick::new(0)), None);
    }
}
