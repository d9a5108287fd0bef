//! Entity discovery - builds the candidate pool of card-like records
//!
//! A record shape is card-like when it is concrete and exposes both the
//! display-name and cost fields. Cards are collected from static collections
//! on those shapes whose name mentions "cards"; only when that finds nothing
//! does the locator fall back to scanning every live instance of the host's
//! base asset kind.

use ahash::{AHashMap, AHashSet};

use crate::core::config::BalanceConfig;
use crate::core::types::EntityId;
use crate::host::{Host, InstanceRef, TypeDescriptor};

/// One discovered card
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: EntityId,
    pub type_name: String,
    /// Display name read at discovery time; `None` if unreadable
    pub display_name: Option<String>,
}

/// Deduplicated cards discovered for one run, in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate unless one with the same identity is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if self.contains(candidate.id) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.candidates.iter().any(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

impl FromIterator<Candidate> for CandidatePool {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        let mut pool = CandidatePool::new();
        for candidate in iter {
            pool.insert(candidate);
        }
        pool
    }
}

/// Discovers the candidate pool from a host
pub struct EntityLocator<'a, H: Host + ?Sized> {
    host: &'a H,
    config: &'a BalanceConfig,
}

impl<'a, H: Host + ?Sized> EntityLocator<'a, H> {
    pub fn new(host: &'a H, config: &'a BalanceConfig) -> Self {
        Self { host, config }
    }

    /// Build a fresh pool for this run
    pub fn discover(&self) -> CandidatePool {
        let types = self.host.enumerate_types();

        let mut found = self.scan_static_collections(&types);
        if found.is_empty() {
            tracing::debug!(
                "[Balance] No static card collections; scanning live {} instances",
                self.config.live_instance_kind
            );
            found = self.scan_live_instances(&types);
        }

        let mut seen = AHashSet::new();
        found
            .into_iter()
            .filter(|inst| seen.insert(inst.id))
            .map(|inst| Candidate {
                display_name: self
                    .host
                    .get_text(inst.id, &self.config.display_name_field),
                id: inst.id,
                type_name: inst.type_name,
            })
            .collect()
    }

    fn is_card_shape(&self, ty: &TypeDescriptor) -> bool {
        ty.has_field(&self.config.display_name_field) && ty.has_field(&self.config.cost_field)
    }

    fn scan_static_collections(&self, types: &[TypeDescriptor]) -> Vec<InstanceRef> {
        let hint = self.config.collection_hint.to_lowercase();
        let mut found = Vec::new();

        for ty in types.iter().filter(|t| !t.is_abstract && self.is_card_shape(t)) {
            for collection in self.host.enumerate_static_collections(ty) {
                if !collection.name.to_lowercase().contains(&hint) {
                    continue;
                }
                // Subclass instances are picked up from their own shape's scan
                found.extend(
                    collection
                        .items
                        .into_iter()
                        .filter(|item| item.type_name == ty.name),
                );
            }
        }

        found
    }

    fn scan_live_instances(&self, types: &[TypeDescriptor]) -> Vec<InstanceRef> {
        let by_name: AHashMap<&str, &TypeDescriptor> =
            types.iter().map(|t| (t.name.as_str(), t)).collect();

        self.host
            .enumerate_live_instances(&self.config.live_instance_kind)
            .into_iter()
            .filter(|inst| {
                by_name
                    .get(inst.type_name.as_str())
                    .is_some_and(|ty| self.is_card_shape(ty))
            })
            .collect()
    }
}

/// Discover the candidate pool with the given config
pub fn discover<H: Host + ?Sized>(host: &H, config: &BalanceConfig) -> CandidatePool {
    EntityLocator::new(host, config).discover()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FieldKind, MemoryHost, TypeDef};

    fn card_type(name: &str) -> TypeDef {
        TypeDef::new(name)
            .base_kind("ScriptableObject")
            .field("DisplayName", FieldKind::Text)
            .field("Cost", FieldKind::Int)
    }

    fn names(pool: &CandidatePool) -> Vec<String> {
        pool.iter()
            .map(|c| c.display_name.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_static_collections_are_scanned() {
        let mut host = MemoryHost::new();
        host.define_type(card_type("CardData"));
        let a = host.spawn("CardData", [("DisplayName", "Torch".into())]).unwrap();
        let b = host.spawn("CardData", [("DisplayName", "Inferno".into())]).unwrap();
        host.add_to_static("CardData", "AllCards", a).unwrap();
        host.add_to_static("CardData", "StarterCards", b).unwrap();
        // Same record twice across collections
        host.add_to_static("CardData", "StarterCards", a).unwrap();
        host.add_to_static("CardData", "Upgrades", b).unwrap();

        let pool = discover(&host, &BalanceConfig::default());
        assert_eq!(names(&pool), vec!["Torch", "Inferno"]);
    }

    #[test]
    fn test_shape_filters() {
        let mut host = MemoryHost::new();
        host.define_type(card_type("BaseCard").abstract_type());
        host.define_type(TypeDef::new("Relic").field("DisplayName", FieldKind::Text));
        host.define_type(card_type("CardData"));
        host.define_type(card_type("SpellCard"));

        let relic = host.spawn("Relic", [("DisplayName", "Relic".into())]).unwrap();
        let spell = host.spawn("SpellCard", [("DisplayName", "Spell".into())]).unwrap();
        let card = host.spawn("CardData", [("DisplayName", "Card".into())]).unwrap();
        host.add_to_static("Relic", "AllCards", relic).unwrap();
        host.add_to_static("BaseCard", "AllCards", card).unwrap();
        // Runtime type must match the declaring shape exactly
        host.add_to_static("CardData", "AllCards", spell).unwrap();
        host.add_to_static("CardData", "AllCards", card).unwrap();

        let pool = discover(&host, &BalanceConfig::default());
        assert_eq!(names(&pool), vec!["Card"]);
    }

    #[test]
    fn test_live_instance_fallback() {
        let mut host = MemoryHost::new();
        host.define_type(card_type("CardData"));
        host.define_type(
            TypeDef::new("Sprite")
                .base_kind("ScriptableObject")
                .field("DisplayName", FieldKind::Text),
        );
        host.spawn("CardData", [("DisplayName", "Torch".into())]).unwrap();
        host.spawn("Sprite", [("DisplayName", "Icon".into())]).unwrap();

        let pool = discover(&host, &BalanceConfig::default());
        assert_eq!(names(&pool), vec!["Torch"]);
    }

    #[test]
    fn test_collection_hint_is_case_insensitive() {
        let mut host = MemoryHost::new();
        host.define_type(card_type("CardData").base_kind("Other"));
        let a = host.spawn("CardData", [("DisplayName", "Torch".into())]).unwrap();
        host.add_to_static("CardData", "ALL_CARDS_LIST", a).unwrap();
        host.add_to_static("CardData", "Decks", a).unwrap();

        let pool = discover(&host, &BalanceConfig::default());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_dedup_by_identity() {
        let id = EntityId::new();
        let candidate = Candidate {
            id,
            type_name: "CardData".into(),
            display_name: Some("Torch".into()),
        };
        let twin = Candidate {
            id: EntityId::new(),
            ..candidate.clone()
        };

        let pool: CandidatePool = vec![candidate.clone(), candidate, twin].into_iter().collect();
        assert_eq!(pool.len(), 2);
    }
}
