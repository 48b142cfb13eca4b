//! The simulation tick counter.

/// A simulation tick number.
///
/// Ticks advance by exactly one per simulation step on both client and
/// server. The counter is 64 bits wide and saturates instead of wrapping;
/// at 60 Hz the ceiling is billions of years away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(u64);

impl Tick {
    /// The first tick of a session.
    pub const ZERO: Self = Self(0);

    /// Creates a new tick.
    #[must_use]
    pub const fn new(tick: u64) -> Self {
        Self(tick)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the following tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the preceding tick, or `None` at tick zero.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Returns this tick moved forward by `steps`.
    #[must_use]
    pub const fn offset(self, steps: u64) -> Self {
        Self(self.0.saturating_add(steps))
    }

    /// Number of steps from `earlier` to `self` (zero if `earlier` is later).
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Iterates `(self, end]`, the ticks a replay after `self` walks.
    pub fn after_through(self, end: Self) -> impl Iterator<Item = Self> {
        (self.0.saturating_add(1)..=end.0).map(Self)
    }
}

impl From<u64> for Tick {
    fn from(tick: u64) -> Self {
        Self(tick)
    }
}

impl From<Tick> for u64 {
    fn from(tick: Tick) -> Self {
        tick.0
    }
}
