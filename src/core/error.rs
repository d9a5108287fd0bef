use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::EntityId;

/// Structural JSON violation, carrying the byte offset where parsing stopped.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("JSON parse error: {message} at pos {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Why a change document produced no changes.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("root of change document is not an object")]
    RootNotObject,

    #[error("changes array missing in JSON")]
    MissingChanges,

    #[error("\"changes\" must be a list, found {found}")]
    ChangesNotList { found: &'static str },
}

/// A single change entry that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntryDecodeError {
    #[error("entry {index} must be an object, found {found}")]
    NotAnObject { index: usize, found: &'static str },
}

/// A single field write that the host refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    #[error("no field named '{0}'")]
    MissingField(String),

    #[error("field '{0}' is not writable")]
    ReadOnly(String),

    #[error("cannot store {found} in field '{field}' of type {expected}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{0}' is not a collection")]
    NotACollection(String),

    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
}

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

pub type Result<T, E = BalanceError> = std::result::Result<T, E>;
