//! Tick-indexed ring buffer.

use std::num::NonZeroUsize;

use crate::error::RingError;
use crate::Tick;

/// A fixed-capacity ring buffer keyed by tick.
///
/// Slot `tick & (capacity - 1)` holds the value for the most recent tick
/// congruent to that index. Each slot stores its tick alongside the value so
/// reads can tell a hit from a slot that has since been reused.
#[derive(Debug, Clone)]
pub struct TickRing<T> {
    slots: Vec<Option<Slot<T>>>,
    mask: u64,
    newest: Option<Tick>,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    tick: Tick,
    value: T,
}

/// Result of reading a slot for a specific tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLookup<'a, T> {
    /// The slot holds the requested tick.
    Hit(&'a T),
    /// Nothing has been written to the slot.
    Empty,
    /// The slot holds a different tick that maps to the same index.
    Stale {
        /// Tick actually stored in the slot.
        found: Tick,
    },
}

impl<'a, T> SlotLookup<'a, T> {
    /// Returns the value on a hit.
    #[must_use]
    pub fn hit(self) -> Option<&'a T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Empty | Self::Stale { .. } => None,
        }
    }
}

impl<T> TickRing<T> {
    /// Creates an empty ring with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::CapacityNotPowerOfTwo`] unless `capacity` is a power of two.
    pub fn new(capacity: NonZeroUsize) -> Result<Self, RingError> {
        let cap = capacity.get();
        if !cap.is_power_of_two() {
            return Err(RingError::CapacityNotPowerOfTwo { capacity: cap });
        }
        let mut slots = Vec::with_capacity(cap);
        slots.resize_with(cap, || None);
        Ok(Self {
            slots,
            mask: cap as u64 - 1,
            newest: None,
        })
    }

    /// Returns the capacity of the ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot index `tick` maps to.
    #[must_use]
    pub fn slot_index(&self, tick: Tick) -> usize {
        (tick.raw() & self.mask) as usize
    }

    /// Returns the newest tick written so far.
    #[must_use]
    pub const fn newest_tick(&self) -> Option<Tick> {
        self.newest
    }

    /// Returns the oldest tick the ring can still answer for.
    ///
    /// This is the window start; the slot itself may be empty.
    #[must_use]
    pub fn window_start(&self) -> Option<Tick> {
        self.newest
            .map(|newest| Tick::new(newest.raw().saturating_sub(self.mask)))
    }

    /// Returns `true` if `tick` falls inside the retained window.
    #[must_use]
    pub fn in_window(&self, tick: Tick) -> bool {
        match (self.window_start(), self.newest) {
            (Some(oldest), Some(newest)) => tick >= oldest && tick <= newest,
            _ => false,
        }
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` if nothing has been written since creation or the last clear.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.newest.is_none()
    }

    /// Writes `value` for `tick`, returning whatever the slot held before.
    ///
    /// Writing over the same tick replaces it; writing a newer tick evicts the
    /// aliased older entry, which is returned with its tick.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::OutsideWindow`] if `tick` is older than the
    /// retained window, since the write would clobber a newer slot.
    pub fn insert(&mut self, tick: Tick, value: T) -> Result<Option<(Tick, T)>, RingError> {
        if let Some(oldest) = self.window_start() {
            if tick < oldest {
                return Err(RingError::OutsideWindow { tick, oldest });
            }
        }

        let idx = self.slot_index(tick);
        let previous = self.slots[idx]
            .replace(Slot { tick, value })
            .map(|slot| (slot.tick, slot.value));

        if self.newest.map_or(true, |newest| tick > newest) {
            self.newest = Some(tick);
        }
        Ok(previous)
    }

    /// Reads the slot for `tick`, reporting empty or stale slots.
    #[must_use]
    pub fn lookup(&self, tick: Tick) -> SlotLookup<'_, T> {
        match &self.slots[self.slot_index(tick)] {
            Some(slot) if slot.tick == tick => SlotLookup::Hit(&slot.value),
            Some(slot) => SlotLookup::Stale { found: slot.tick },
            None => SlotLookup::Empty,
        }
    }

    /// Returns the value for an exact tick, if the slot still holds it.
    #[must_use]
    pub fn get(&self, tick: Tick) -> Option<&T> {
        self.lookup(tick).hit()
    }

    /// Returns a mutable value for an exact tick, if the slot still holds it.
    pub fn get_mut(&mut self, tick: Tick) -> Option<&mut T> {
        let idx = self.slot_index(tick);
        match &mut self.slots[idx] {
            Some(slot) if slot.tick == tick => Some(&mut slot.value),
            _ => None,
        }
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn newest(&self) -> Option<(Tick, &T)> {
        let tick = self.newest?;
        self.get(tick).map(|value| (tick, value))
    }

    /// Iterates retained entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (Tick, &T)> {
        let (start, end) = match (self.window_start(), self.newest) {
            (Some(oldest), Some(newest)) => (oldest.raw(), newest.raw()),
            _ => (1, 0),
        };
        (start..=end).filter_map(move |raw| {
            let tick = Tick::new(raw);
            self.get(tick).map(|value| (tick, value))
        })
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.newest = None;
    }
}
