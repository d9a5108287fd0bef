//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of one host-owned record for the duration of a run.
///
/// Deduplication of the candidate pool is keyed on this, never on field
/// contents: two records with identical fields are still two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four core numeric attributes of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Cost,
    Attack,
    Health,
    Space,
}

impl StatField {
    /// Write order used by the mutator.
    pub const ALL: [StatField; 4] = [
        StatField::Cost,
        StatField::Attack,
        StatField::Health,
        StatField::Space,
    ];

    /// Field name on the host record
    pub fn field_name(self) -> &'static str {
        match self {
            StatField::Cost => "Cost",
            StatField::Attack => "Attack",
            StatField::Health => "Health",
            StatField::Space => "Space",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn test_stat_write_order() {
        let names: Vec<_> = StatField::ALL.iter().map(|f| f.field_name()).collect();
        assert_eq!(names, vec!["Cost", "Attack", "Health", "Space"]);
    }
}
