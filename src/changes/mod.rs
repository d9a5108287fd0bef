//! Change records and the loader that reads them from the change document

pub mod loader;
pub mod record;

pub use loader::{
    decode_changes, find_file_recursive, load_changes, load_configured_changes,
    locate_change_file, try_load_changes,
};
pub use record::{ChangeRecord, Statline};
