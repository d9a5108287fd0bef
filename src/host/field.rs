//! Field values and declared field types on host records

use serde::{Deserialize, Serialize};

use crate::core::error::WriteError;
use crate::core::types::EntityId;

/// Declared type of a field on a host record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    Text,
    /// Ordered, appendable collection
    List,
    /// Reference to another host record
    Object,
}

impl FieldKind {
    /// Value a freshly created record holds before anything is written.
    pub fn default_value(self) -> FieldValue {
        match self {
            FieldKind::Int => FieldValue::Int(0),
            FieldKind::Float => FieldValue::Float(0.0),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Text | FieldKind::Object => FieldValue::Null,
            FieldKind::List => FieldValue::List(Vec::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Text => "text",
            FieldKind::List => "list",
            FieldKind::Object => "object",
        }
    }
}

/// A value read from or written to a host record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Object(EntityId),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<EntityId> {
        match self {
            FieldValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::List(_) => "list",
            FieldValue::Object(_) => "object",
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Object(id) => write!(f, "<{}>", id),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(i64::from(n))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Convert `value` to the declared type of `field`.
///
/// Integers widen to floats, become `true` when non-zero and print as
/// decimal text. Floats round half-to-even into integer fields. Null is only
/// accepted by reference-like fields.
pub fn coerce(value: FieldValue, kind: FieldKind, field: &str) -> Result<FieldValue, WriteError> {
    let mismatch = |value: &FieldValue| WriteError::TypeMismatch {
        field: field.to_string(),
        expected: kind.name().to_string(),
        found: value.kind_name().to_string(),
    };

    let coerced = match (value, kind) {
        (FieldValue::Int(n), FieldKind::Int) => FieldValue::Int(n),
        (FieldValue::Int(n), FieldKind::Float) => FieldValue::Float(n as f64),
        (FieldValue::Int(n), FieldKind::Bool) => FieldValue::Bool(n != 0),
        (FieldValue::Int(n), FieldKind::Text) => FieldValue::Text(n.to_string()),
        (FieldValue::Float(x), FieldKind::Float) => FieldValue::Float(x),
        (FieldValue::Float(x), FieldKind::Int) => {
            let rounded = x.round_ties_even();
            if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
                return Err(mismatch(&FieldValue::Float(x)));
            }
            FieldValue::Int(rounded as i64)
        }
        (FieldValue::Bool(b), FieldKind::Bool) => FieldValue::Bool(b),
        (FieldValue::Bool(b), FieldKind::Int) => FieldValue::Int(i64::from(b)),
        (FieldValue::Text(s), FieldKind::Text) => FieldValue::Text(s),
        (FieldValue::List(items), FieldKind::List) => FieldValue::List(items),
        (FieldValue::Object(id), FieldKind::Object) => FieldValue::Object(id),
        (FieldValue::Null, FieldKind::Text | FieldKind::List | FieldKind::Object) => FieldValue::Null,
        (other, _) => return Err(mismatch(&other)),
    };

    Ok(coerced)
}
