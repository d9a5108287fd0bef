//! Host environment abstraction
//!
//! The engine reaches card records only through the capability traits in
//! [`capability`]. [`MemoryHost`] is the bundled implementation.

pub mod capability;
pub mod field;
pub mod memory;
pub mod snapshot;

pub use capability::{
    EntityDiscovery, FieldAccessor, Host, InstanceRef, StaticCollection, TypeDescriptor,
};
pub use field::{coerce, FieldKind, FieldValue};
pub use memory::{FieldDef, MemoryHost, TypeDef};
pub use snapshot::{FieldSnapshot, HostSnapshot, InstanceSnapshot, TypeSnapshot};
