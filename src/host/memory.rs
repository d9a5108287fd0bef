//! In-memory host: record shapes and records held in plain maps
//!
//! Used by the command-line runner (loaded from a JSON snapshot) and by
//! tests as a fake card database.

use ahash::AHashMap;

use crate::core::error::{BalanceError, Result, WriteError};
use crate::core::types::EntityId;
use crate::host::capability::{
    EntityDiscovery, FieldAccessor, InstanceRef, StaticCollection, TypeDescriptor,
};
use crate::host::field::{coerce, FieldKind, FieldValue};

/// A declared field on a record shape
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub writable: bool,
}

/// A record shape
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub is_abstract: bool,
    /// Base kind used by the live-instance scan
    pub base_kind: Option<String>,
    pub fields: Vec<FieldDef>,
    /// Static collections declared on this shape, in declaration order
    pub statics: Vec<(String, Vec<EntityId>)>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            base_kind: None,
            fields: Vec::new(),
            statics: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            writable: true,
        });
        self
    }

    pub fn readonly_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            writable: false,
        });
        self
    }

    pub fn base_kind(mut self, kind: impl Into<String>) -> Self {
        self.base_kind = Some(kind.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn static_collection(mut self, name: impl Into<String>) -> Self {
        self.statics.push((name.into(), Vec::new()));
        self
    }

    fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name.clone(),
            is_abstract: self.is_abstract,
            instance_fields: self.fields.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct Record {
    type_name: String,
    fields: AHashMap<String, FieldValue>,
}

/// The in-memory card database
#[derive(Debug, Default)]
pub struct MemoryHost {
    types: Vec<TypeDef>,
    by_name: AHashMap<String, usize>,
    records: AHashMap<EntityId, Record>,
    /// Spawn order, so enumeration is deterministic
    order: Vec<EntityId>,
    /// Snapshot keys for records loaded from or written to disk
    keys: AHashMap<EntityId, String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record shape; redefining a name replaces it
    pub fn define_type(&mut self, def: TypeDef) {
        match self.by_name.get(&def.name) {
            Some(&index) => self.types[index] = def,
            None => {
                self.by_name.insert(def.name.clone(), self.types.len());
                self.types.push(def);
            }
        }
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    /// Create a record of `type_name`. Undeclared fields are rejected; declared
    /// fields not given start at their kind's default.
    pub fn spawn<'a>(
        &mut self,
        type_name: &str,
        fields: impl IntoIterator<Item = (&'a str, FieldValue)>,
    ) -> Result<EntityId> {
        let def = self
            .type_def(type_name)
            .ok_or_else(|| BalanceError::InvalidSnapshot(format!("unknown type '{}'", type_name)))?;

        let mut values: AHashMap<String, FieldValue> = def
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.kind.default_value()))
            .collect();

        for (name, value) in fields {
            let field = def
                .field_def(name)
                .ok_or_else(|| WriteError::MissingField(name.to_string()))?;
            values.insert(name.to_string(), coerce(value, field.kind, name)?);
        }

        let id = EntityId::new();
        self.records.insert(
            id,
            Record {
                type_name: type_name.to_string(),
                fields: values,
            },
        );
        self.order.push(id);
        Ok(id)
    }

    /// Add an existing record to a static collection declared on `type_name`
    pub fn add_to_static(&mut self, type_name: &str, collection: &str, id: EntityId) -> Result<()> {
        let index = *self
            .by_name
            .get(type_name)
            .ok_or_else(|| BalanceError::InvalidSnapshot(format!("unknown type '{}'", type_name)))?;

        let statics = &mut self.types[index].statics;
        match statics.iter_mut().find(|(name, _)| name == collection) {
            Some((_, items)) => items.push(id),
            None => statics.push((collection.to_string(), vec![id])),
        }
        Ok(())
    }

    pub fn set_key(&mut self, id: EntityId, key: impl Into<String>) {
        self.keys.insert(id, key.into());
    }

    /// Snapshot key of a record, falling back to its id
    pub fn key_of(&self, id: EntityId) -> String {
        self.keys.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }

    /// Direct read for inspection
    pub fn field(&self, id: EntityId, name: &str) -> Option<&FieldValue> {
        self.records.get(&id)?.fields.get(name)
    }

    pub fn type_of(&self, id: EntityId) -> Option<&str> {
        self.records.get(&id).map(|r| r.type_name.as_str())
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Records in spawn order
    pub fn record_ids(&self) -> &[EntityId] {
        &self.order
    }

    /// First record whose text field `field` equals `value`
    pub fn find_by_text(&self, field: &str, value: &str) -> Option<EntityId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.field(*id, field).and_then(FieldValue::as_text) == Some(value))
    }

    /// Store a value without write checks; used when loading snapshots.
    pub(crate) fn write_raw(&mut self, id: EntityId, name: &str, value: FieldValue) {
        if let Some(record) = self.records.get_mut(&id) {
            record.fields.insert(name.to_string(), value);
        }
    }

    fn declared_field(&self, entity: EntityId, name: &str) -> Result<&FieldDef, WriteError> {
        let record = self
            .records
            .get(&entity)
            .ok_or(WriteError::UnknownEntity(entity))?;
        self.type_def(&record.type_name)
            .and_then(|def| def.field_def(name))
            .ok_or_else(|| WriteError::MissingField(name.to_string()))
    }

    fn instance_ref(&self, id: EntityId) -> Option<InstanceRef> {
        self.records.get(&id).map(|r| InstanceRef {
            id,
            type_name: r.type_name.clone(),
        })
    }
}

impl EntityDiscovery for MemoryHost {
    fn enumerate_types(&self) -> Vec<TypeDescriptor> {
        self.types.iter().map(TypeDef::descriptor).collect()
    }

    fn enumerate_static_collections(&self, ty: &TypeDescriptor) -> Vec<StaticCollection> {
        let Some(def) = self.type_def(&ty.name) else {
            return Vec::new();
        };

        def.statics
            .iter()
            .map(|(name, ids)| StaticCollection {
                name: name.clone(),
                items: ids.iter().filter_map(|id| self.instance_ref(*id)).collect(),
            })
            .collect()
    }

    fn enumerate_live_instances(&self, base_kind: &str) -> Vec<InstanceRef> {
        self.order
            .iter()
            .filter_map(|id| self.instance_ref(*id))
            .filter(|inst| {
                self.type_def(&inst.type_name)
                    .and_then(|def| def.base_kind.as_deref())
                    == Some(base_kind)
            })
            .collect()
    }
}

impl FieldAccessor for MemoryHost {
    fn has_field(&self, entity: EntityId, name: &str) -> bool {
        self.declared_field(entity, name).is_ok()
    }

    fn get(&self, entity: EntityId, name: &str) -> Option<FieldValue> {
        self.field(entity, name).cloned()
    }

    fn set(&mut self, entity: EntityId, name: &str, value: FieldValue) -> Result<(), WriteError> {
        let def = self.declared_field(entity, name)?;
        if !def.writable {
            return Err(WriteError::ReadOnly(name.to_string()));
        }
        let value = coerce(value, def.kind, name)?;

        let record = self
            .records
            .get_mut(&entity)
            .ok_or(WriteError::UnknownEntity(entity))?;
        record.fields.insert(name.to_string(), value);
        Ok(())
    }

    fn append_to_collection(
        &mut self,
        entity: EntityId,
        name: &str,
        value: FieldValue,
    ) -> Result<(), WriteError> {
        // Collections are mutated in place, so read-only fields still accept appends
        if self.declared_field(entity, name)?.kind != FieldKind::List {
            return Err(WriteError::NotACollection(name.to_string()));
        }

        let record = self
            .records
            .get_mut(&entity)
            .ok_or(WriteError::UnknownEntity(entity))?;
        match record.fields.get_mut(name) {
            Some(FieldValue::List(items)) => {
                items.push(value);
                Ok(())
            }
            Some(slot) if *slot == FieldValue::Null => {
                *slot = FieldValue::List(vec![value]);
                Ok(())
            }
            _ => Err(WriteError::NotACollection(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_type() -> TypeDef {
        TypeDef::new("CardData")
            .base_kind("ScriptableObject")
            .readonly_field("DisplayName", FieldKind::Text)
            .field("Cost", FieldKind::Int)
            .field("Damage", FieldKind::Float)
            .field("Keywords", FieldKind::List)
            .static_collection("AllCards")
    }

    #[test]
    fn test_spawn_defaults_and_reads() {
        let mut host = MemoryHost::new();
        host.define_type(card_type());
        let id = host
            .spawn("CardData", [("DisplayName", "Torch".into()), ("Cost", 2.into())])
            .unwrap();

        assert_eq!(host.get_text(id, "DisplayName").as_deref(), Some("Torch"));
        assert_eq!(host.get(id, "Cost"), Some(FieldValue::Int(2)));
        assert_eq!(host.get(id, "Damage"), Some(FieldValue::Float(0.0)));
        assert_eq!(host.get(id, "Keywords"), Some(FieldValue::List(vec![])));
        assert!(host.get(id, "Nope").is_none());
    }

    #[test]
    fn test_spawn_rejects_unknown_field_and_type() {
        let mut host = MemoryHost::new();
        host.define_type(card_type());
        assert!(host.spawn("CardData", [("Nope", 1.into())]).is_err());
        assert!(host.spawn("Missing", []).is_err());
    }

    #[test]
    fn test_set_coerces_and_guards() {
        let mut host = MemoryHost::new();
        host.define_type(card_type());
        let id = host.spawn("CardData", []).unwrap();

        assert!(host.set(id, "Damage", 3.into()).is_ok());
        assert_eq!(host.get(id, "Damage"), Some(FieldValue::Float(3.0)));

        assert_eq!(
            host.set(id, "DisplayName", "X".into()),
            Err(WriteError::ReadOnly("DisplayName".into()))
        );
        assert_eq!(
            host.set(id, "Armor", 1.into()),
            Err(WriteError::MissingField("Armor".into()))
        );
        assert!(matches!(
            host.set(id, "Cost", "cheap".into()),
            Err(WriteError::TypeMismatch { .. })
        ));

        let ghost = EntityId::new();
        assert_eq!(host.set(ghost, "Cost", 1.into()), Err(WriteError::UnknownEntity(ghost)));
    }

    #[test]
    fn test_append_to_collection() {
        let mut host = MemoryHost::new();
        host.define_type(card_type());
        let id = host.spawn("CardData", []).unwrap();

        host.append_to_collection(id, "Keywords", "Sweep".into()).unwrap();
        assert_eq!(
            host.get(id, "Keywords"),
            Some(FieldValue::List(vec!["Sweep".into()]))
        );
        assert_eq!(
            host.append_to_collection(id, "Cost", 1.into()),
            Err(WriteError::NotACollection("Cost".into()))
        );
    }

    #[test]
    fn test_discovery_enumeration() {
        let mut host = MemoryHost::new();
        host.define_type(card_type());
        host.define_type(TypeDef::new("Relic").field("DisplayName", FieldKind::Text));
        let a = host.spawn("CardData", []).unwrap();
        let _relic = host.spawn("Relic", []).unwrap();
        host.add_to_static("CardData", "AllCards", a).unwrap();

        let types = host.enumerate_types();
        assert_eq!(types.len(), 2);
        assert!(types[0].has_field("Cost"));

        let statics = host.enumerate_static_collections(&types[0]);
        assert_eq!(statics.len(), 1);
        assert_eq!(statics[0].name, "AllCards");
        assert_eq!(statics[0].items[0].id, a);

        let live = host.enumerate_live_instances("ScriptableObject");
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].type_name, "CardData");
    }
}
