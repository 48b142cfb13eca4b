//! Identifier types.

/// A stable identifier for a controlled entity.
///
/// Assigned by the server at spawn and stable for the entity's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw entity ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_roundtrips_raw() {
        let id: EntityId = 123u32.into();
        assert_eq!(id.raw(), 123);
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn entity_id_ordering_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(EntityId::new(1));
        set.insert(EntityId::new(1));
        set.insert(EntityId::new(2));
        assert_eq!(set.len(), 2);
        assert!(EntityId::new(1) < EntityId::new(2));
    }
}
