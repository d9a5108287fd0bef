//! Minimal JSON value model and parser for change documents
//!
//! A bespoke parser rather than serde_json: change documents in the wild
//! contain mistyped literals that must read as null instead of failing the
//! whole file.

pub mod parser;
pub mod value;

pub use parser::{parse, parse_with_mode};
pub use value::Value;
