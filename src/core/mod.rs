pub mod config;
pub mod error;
pub mod types;

pub use config::{BalanceConfig, ParseMode};
pub use error::{BalanceError, EntryDecodeError, LoadError, ParseError, Result, WriteError};
pub use types::{EntityId, StatField};
