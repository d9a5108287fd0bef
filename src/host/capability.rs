//! Capabilities the engine needs from the environment that owns the cards
//!
//! The engine never knows concrete record types. It asks the host which
//! record shapes exist, where their static collections live, and reads or
//! writes fields by name.

use crate::core::error::WriteError;
use crate::core::types::EntityId;
use crate::host::field::FieldValue;

/// A record shape known to the host
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub is_abstract: bool,
    /// Names of the instance fields records of this shape expose
    pub instance_fields: Vec<String>,
}

impl TypeDescriptor {
    pub fn has_field(&self, name: &str) -> bool {
        self.instance_fields.iter().any(|f| f == name)
    }
}

/// A live record together with the exact name of its runtime shape
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRef {
    pub id: EntityId,
    pub type_name: String,
}

/// A static, enumerable member declared on a record shape
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCollection {
    pub name: String,
    pub items: Vec<InstanceRef>,
}

/// Enumeration of record shapes and live records
pub trait EntityDiscovery {
    /// Every loaded record shape
    fn enumerate_types(&self) -> Vec<TypeDescriptor>;

    /// Static enumerable members declared on `ty`
    fn enumerate_static_collections(&self, ty: &TypeDescriptor) -> Vec<StaticCollection>;

    /// Every live record deriving from `base_kind`
    fn enumerate_live_instances(&self, base_kind: &str) -> Vec<InstanceRef>;
}

/// Named field access on opaque records
pub trait FieldAccessor {
    /// Whether `entity` exposes a field called `name`
    fn has_field(&self, entity: EntityId, name: &str) -> bool;

    /// Current value of a field; `None` when the entity or field is unknown
    fn get(&self, entity: EntityId, name: &str) -> Option<FieldValue>;

    /// Overwrite a field, coercing `value` to the field's declared type
    fn set(&mut self, entity: EntityId, name: &str, value: FieldValue) -> Result<(), WriteError>;

    /// Append to an ordered collection field in place
    fn append_to_collection(
        &mut self,
        entity: EntityId,
        name: &str,
        value: FieldValue,
    ) -> Result<(), WriteError>;

    /// Read a text field
    fn get_text(&self, entity: EntityId, name: &str) -> Option<String> {
        match self.get(entity, name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

/// Everything the orchestrator needs from one environment.
pub trait Host: EntityDiscovery + FieldAccessor {}

impl<T: EntityDiscovery + FieldAccessor> Host for T {}
