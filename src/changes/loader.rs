//! Locate and load the change document
//!
//! Loading never fails outward: a missing file, an unreadable document or a
//! wrongly shaped root all degrade to "no changes" with a logged warning, and
//! a malformed entry only costs that entry.

use std::fs;
use std::path::{Path, PathBuf};

use crate::changes::record::ChangeRecord;
use crate::core::config::{BalanceConfig, ParseMode};
use crate::core::error::LoadError;
use crate::json::{parse_with_mode, Value};

/// Find the change document.
///
/// Search order: the fixed location under the host root, a recursive search
/// of the host root, then a recursive search of the working directory.
pub fn locate_change_file(config: &BalanceConfig) -> Option<PathBuf> {
    let name = config.change_file_name.as_str();

    if let Some(root) = &config.host_root {
        let fixed = root.join(&config.plugin_relative_dir).join(name);
        if fixed.is_file() {
            return Some(fixed);
        }
        if let Some(found) = find_file_recursive(root, name) {
            return Some(found);
        }
    }

    if config.search_working_dir {
        match std::env::current_dir() {
            Ok(cwd) => return find_file_recursive(&cwd, name),
            Err(e) => tracing::debug!("[Balance] Working directory unavailable: {}", e),
        }
    }

    None
}

/// Depth-first search for a file called `name`, checking each directory's own
/// files before descending. Entries are visited in sorted order and
/// unreadable directories are skipped.
pub fn find_file_recursive(root: &Path, name: &str) -> Option<PathBuf> {
    let mut entries: Vec<_> = match fs::read_dir(root) {
        Ok(read) => read.filter_map(|e| e.ok()).collect(),
        Err(e) => {
            tracing::debug!("[Balance] Skipping {}: {}", root.display(), e);
            return None;
        }
    };
    entries.sort_by_key(|e| e.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if file_type.is_file() && entry.file_name() == name {
            return Some(entry.path());
        }
    }

    subdirs
        .iter()
        .find_map(|dir| find_file_recursive(dir, name))
}

/// Load change records from `path`, logging and swallowing every failure.
pub fn load_changes(path: &Path, mode: ParseMode) -> Vec<ChangeRecord> {
    match try_load_changes(path, mode) {
        Ok(changes) => changes,
        Err(e) => {
            tracing::warn!("[Balance] {}; skipping.", e);
            Vec::new()
        }
    }
}

/// Resolve the change document from config and load it.
pub fn load_configured_changes(config: &BalanceConfig) -> Vec<ChangeRecord> {
    match locate_change_file(config) {
        Some(path) => {
            tracing::info!("[Balance] Using change document {}", path.display());
            load_changes(&path, config.parse_mode)
        }
        None => {
            tracing::warn!(
                "[Balance] {}",
                LoadError::NotFound(config.change_file_name.clone())
            );
            Vec::new()
        }
    }
}

/// Read and decode a change document; document-level failures are errors,
/// entry-level failures are logged and skipped.
pub fn try_load_changes(path: &Path, mode: ParseMode) -> Result<Vec<ChangeRecord>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root = parse_with_mode(&text, mode)?;
    decode_changes(&root)
}

/// Decode the `changes` array of an already parsed document.
pub fn decode_changes(root: &Value) -> Result<Vec<ChangeRecord>, LoadError> {
    let map = root.as_map().ok_or(LoadError::RootNotObject)?;
    let raw = map.get("changes").ok_or(LoadError::MissingChanges)?;
    let entries = raw.as_list().ok_or(LoadError::ChangesNotList {
        found: raw.kind_name(),
    })?;

    let mut changes = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match ChangeRecord::decode(entry, index) {
            Ok(Some(change)) => changes.push(change),
            Ok(None) => {
                tracing::warn!("[Balance] Change entry {} has no cardName; skipping.", index)
            }
            Err(e) => tracing::warn!("[Balance] Could not parse change item: {}", e),
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse;

    #[test]
    fn test_decode_skips_bad_entries() {
        let root = parse(
            r#"{"changes": [
                {"cardName": "Inferno", "newStatline": {"cost": 1}},
                42,
                {"newEffect": "orphan"},
                {"cardName": "Torch"}
            ]}"#,
        )
        .unwrap();

        let changes = decode_changes(&root).unwrap();
        let names: Vec<_> = changes.iter().map(|c| c.card_name.as_str()).collect();
        assert_eq!(names, vec!["Inferno", "Torch"]);
    }

    #[test]
    fn test_decode_root_shape_errors() {
        assert!(matches!(
            decode_changes(&parse("[1]").unwrap()),
            Err(LoadError::RootNotObject)
        ));
        assert!(matches!(
            decode_changes(&parse("{}").unwrap()),
            Err(LoadError::MissingChanges)
        ));
        let err = decode_changes(&parse(r#"{"changes": {}}"#).unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::ChangesNotList { found: "object" }));
        assert_eq!(err.to_string(), "\"changes\" must be a list, found object");
    }

    #[test]
    fn test_duplicate_names_are_kept_in_order() {
        let root = parse(
            r#"{"changes": [
                {"cardName": "A", "newEffect": "first"},
                {"cardName": "A", "newEffect": "second"}
            ]}"#,
        )
        .unwrap();

        let changes = decode_changes(&root).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].new_effect.as_deref(), Some("second"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let changes = load_changes(&dir.path().join("nope.json"), ParseMode::Lenient);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_load_unparseable_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balance_changes.json");
        fs::write(&path, r#"{"changes": [ {"cardName": "A""#).unwrap();

        assert!(matches!(
            try_load_changes(&path, ParseMode::Lenient),
            Err(LoadError::Parse(_))
        ));
        assert!(load_changes(&path, ParseMode::Lenient).is_empty());
    }

    #[test]
    fn test_fixed_location_wins() {
        let dir = tempfile::tempdir().unwrap();
        let fixed_dir = dir.path().join("plugins/UnofficialBalanceV1/mod/config");
        fs::create_dir_all(&fixed_dir).unwrap();
        fs::create_dir_all(dir.path().join("aaa")).unwrap();
        fs::write(dir.path().join("aaa/balance_changes.json"), "{}").unwrap();
        fs::write(fixed_dir.join("balance_changes.json"), "{}").unwrap();

        let config = BalanceConfig {
            host_root: Some(dir.path().to_path_buf()),
            search_working_dir: false,
            ..BalanceConfig::default()
        };

        assert_eq!(
            locate_change_file(&config),
            Some(fixed_dir.join("balance_changes.json"))
        );
    }

    #[test]
    fn test_recursive_search_under_host_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/deep")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/deep/balance_changes.json"), "{}").unwrap();
        fs::write(dir.path().join("a/balance_changes.json"), "{}").unwrap();

        let config = BalanceConfig {
            host_root: Some(dir.path().to_path_buf()),
            search_working_dir: false,
            ..BalanceConfig::default()
        };

        assert_eq!(
            locate_change_file(&config),
            Some(dir.path().join("a/balance_changes.json"))
        );
    }

    #[test]
    fn test_not_found_without_roots() {
        let dir = tempfile::tempdir().unwrap();
        let config = BalanceConfig {
            host_root: Some(dir.path().to_path_buf()),
            search_working_dir: false,
            ..BalanceConfig::default()
        };
        assert_eq!(locate_change_file(&config), None);
        assert!(load_configured_changes(&config).is_empty());
    }
}
