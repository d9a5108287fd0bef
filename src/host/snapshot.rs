//! JSON snapshot format for the in-memory host
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "CardData", "base_kind": "ScriptableObject",
//!       "fields": [ { "name": "DisplayName", "kind": "text", "writable": false },
//!                   { "name": "Effects", "kind": "list" } ],
//!       "statics": { "AllCards": ["torch"] } }
//!   ],
//!   "instances": [
//!     { "key": "torch", "type": "CardData",
//!       "fields": { "DisplayName": "Torch", "Effects": [ { "ref": "torch-hit" } ] } }
//!   ]
//! }
//! ```
//!
//! Records reference each other by `key`; object fields hold the key string,
//! list elements hold `{ "ref": key }`.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::error::{BalanceError, Result};
use crate::core::types::EntityId;
use crate::host::field::{FieldKind, FieldValue};
use crate::host::memory::{FieldDef, MemoryHost, TypeDef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub types: Vec<TypeSnapshot>,
    #[serde(default)]
    pub instances: Vec<InstanceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSnapshot {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_kind: Option<String>,
    pub fields: Vec<FieldSnapshot>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub statics: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default = "default_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, Json>,
}

impl HostSnapshot {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl MemoryHost {
    /// Build a host from a snapshot. Records are created in snapshot order,
    /// then references and static collections are linked by key.
    pub fn from_snapshot(snapshot: &HostSnapshot) -> Result<Self> {
        let mut host = MemoryHost::new();

        for ty in &snapshot.types {
            let mut def = TypeDef::new(ty.name.clone());
            def.is_abstract = ty.is_abstract;
            def.base_kind = ty.base_kind.clone();
            def.fields = ty
                .fields
                .iter()
                .map(|f| FieldDef {
                    name: f.name.clone(),
                    kind: f.kind,
                    writable: f.writable,
                })
                .collect();
            host.define_type(def);
        }

        let mut ids: AHashMap<&str, EntityId> = AHashMap::new();
        for inst in &snapshot.instances {
            if ids.contains_key(inst.key.as_str()) {
                return Err(BalanceError::InvalidSnapshot(format!(
                    "duplicate instance key '{}'",
                    inst.key
                )));
            }
            let id = host.spawn(&inst.type_name, [])?;
            host.set_key(id, inst.key.clone());
            ids.insert(inst.key.as_str(), id);
        }

        for inst in &snapshot.instances {
            let id = ids[inst.key.as_str()];
            let def = host
                .type_def(&inst.type_name)
                .cloned()
                .ok_or_else(|| invalid(format!("unknown type '{}'", inst.type_name)))?;

            for (name, json) in &inst.fields {
                let field = def
                    .fields
                    .iter()
                    .find(|f| &f.name == name)
                    .ok_or_else(|| invalid(format!("'{}' has no field '{}'", inst.type_name, name)))?;
                let value = json_to_field(json, field.kind, &ids)
                    .map_err(|e| invalid(format!("{}.{}: {}", inst.key, name, e)))?;
                host.write_raw(id, name, value);
            }
        }

        for ty in &snapshot.types {
            for (collection, keys) in &ty.statics {
                for key in keys {
                    let id = *ids
                        .get(key.as_str())
                        .ok_or_else(|| invalid(format!("unknown instance key '{}'", key)))?;
                    host.add_to_static(&ty.name, collection, id)?;
                }
            }
        }

        Ok(host)
    }

    /// Snapshot of the current state, suitable for writing back to disk.
    pub fn to_snapshot(&self) -> HostSnapshot {
        let types = self
            .types()
            .iter()
            .map(|def| TypeSnapshot {
                name: def.name.clone(),
                is_abstract: def.is_abstract,
                base_kind: def.base_kind.clone(),
                fields: def
                    .fields
                    .iter()
                    .map(|f| FieldSnapshot {
                        name: f.name.clone(),
                        kind: f.kind,
                        writable: f.writable,
                    })
                    .collect(),
                statics: def
                    .statics
                    .iter()
                    .map(|(name, ids)| (name.clone(), ids.iter().map(|id| self.key_of(*id)).collect()))
                    .collect(),
            })
            .collect();

        let instances = self
            .record_ids()
            .iter()
            .filter_map(|id| {
                let type_name = self.type_of(*id)?;
                let def = self.type_def(type_name)?;
                let fields = def
                    .fields
                    .iter()
                    .filter_map(|f| {
                        let value = self.field(*id, &f.name)?;
                        Some((f.name.clone(), self.field_to_json(value)))
                    })
                    .collect();
                Some(InstanceSnapshot {
                    key: self.key_of(*id),
                    type_name: type_name.to_string(),
                    fields,
                })
            })
            .collect();

        HostSnapshot { types, instances }
    }

    fn field_to_json(&self, value: &FieldValue) -> Json {
        match value {
            FieldValue::Null => Json::Null,
            FieldValue::Bool(b) => Json::Bool(*b),
            FieldValue::Int(n) => Json::from(*n),
            FieldValue::Float(x) => serde_json::Number::from_f64(*x).map_or(Json::Null, Json::Number),
            FieldValue::Text(s) => Json::String(s.clone()),
            FieldValue::List(items) => Json::Array(
                items
                    .iter()
                    .map(|item| match item {
                        FieldValue::Object(id) => serde_json::json!({ "ref": self.key_of(*id) }),
                        other => self.field_to_json(other),
                    })
                    .collect(),
            ),
            FieldValue::Object(id) => Json::String(self.key_of(*id)),
        }
    }
}

fn invalid(message: String) -> BalanceError {
    BalanceError::InvalidSnapshot(message)
}

fn json_to_field(
    json: &Json,
    kind: FieldKind,
    ids: &AHashMap<&str, EntityId>,
) -> std::result::Result<FieldValue, String> {
    let lookup = |key: &str| {
        ids.get(key)
            .copied()
            .ok_or_else(|| format!("unknown instance key '{}'", key))
    };

    match (kind, json) {
        (_, Json::Null) => Ok(FieldValue::Null),
        (FieldKind::Int, Json::Number(n)) => n
            .as_i64()
            .map(FieldValue::Int)
            .ok_or_else(|| format!("{} is not an integer", n)),
        (FieldKind::Float, Json::Number(n)) => n
            .as_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| format!("{} is not a number", n)),
        (FieldKind::Bool, Json::Bool(b)) => Ok(FieldValue::Bool(*b)),
        (FieldKind::Text, Json::String(s)) => Ok(FieldValue::Text(s.clone())),
        (FieldKind::Object, Json::String(key)) => lookup(key).map(FieldValue::Object),
        (FieldKind::List, Json::Array(items)) => items
            .iter()
            .map(|item| list_item(item, &lookup))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(FieldValue::List),
        (kind, other) => Err(format!("expected {}, found {}", kind.name(), other)),
    }
}

fn list_item(
    json: &Json,
    lookup: &dyn Fn(&str) -> std::result::Result<EntityId, String>,
) -> std::result::Result<FieldValue, String> {
    match json {
        Json::Null => Ok(FieldValue::Null),
        Json::Bool(b) => Ok(FieldValue::Bool(*b)),
        Json::Number(n) => Ok(n
            .as_i64()
            .map(FieldValue::Int)
            .unwrap_or_else(|| FieldValue::Float(n.as_f64().unwrap_or(0.0)))),
        Json::String(s) => Ok(FieldValue::Text(s.clone())),
        Json::Object(map) => match map.get("ref").and_then(Json::as_str) {
            Some(key) => lookup(key).map(FieldValue::Object),
            None => Err("list objects must be { \"ref\": key }".to_string()),
        },
        Json::Array(items) => items
            .iter()
            .map(|item| list_item(item, lookup))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(FieldValue::List),
    }
}
