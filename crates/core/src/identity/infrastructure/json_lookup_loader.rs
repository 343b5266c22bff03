use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::identity::domain::label_resolver::ExternalLookup;

#[derive(Error, Debug)]
pub enum LookupLoadError {
    #[error("failed to read lookup file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lookup file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of the lookup array. Every field is optional; ids may be
/// written as strings or numbers.
#[derive(Deserialize)]
struct LookupRecord {
    #[serde(default, alias = "external_id")]
    nid: Option<Value>,
    #[serde(default, alias = "display_name")]
    name: Option<Value>,
    #[serde(default)]
    person_id: Option<Value>,
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a JSON array of `{nid, name, person_id}` records.
///
/// Records without an id are ignored. A later record for the same id
/// replaces an earlier one.
pub fn load(path: &Path) -> Result<ExternalLookup, LookupLoadError> {
    let text = fs::read_to_string(path).map_err(|source| LookupLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<LookupRecord> =
        serde_json::from_str(&text).map_err(|source| LookupLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut lookup = ExternalLookup::new();
    for record in &records {
        let Some(id) = scalar_text(record.nid.as_ref()) else {
            continue;
        };
        if let Some(name) = scalar_text(record.name.as_ref()) {
            lookup.insert_name(id.clone(), name);
        }
        if let Some(person_id) = scalar_text(record.person_id.as_ref()) {
            lookup.insert_person_id(id, person_id);
        }
    }

    log::info!("Loaded {} lookup records from {}", lookup.len(), path.display());
    Ok(lookup)
}

/// Like [`load`], but a missing or unreadable file yields an empty lookup
/// with a warning instead of an error.
pub fn load_or_empty(path: Option<&Path>) -> ExternalLookup {
    let Some(path) = path else {
        return ExternalLookup::new();
    };
    load(path).unwrap_or_else(|e| {
        log::warn!("{e}. Continuing without external names");
        ExternalLookup::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_lookup(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.json");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_records() {
        let (_dir, path) = write_lookup(
            r#"[
                {"nid": "1234", "name": "Alice Smith", "person_id": "EMP-17"},
                {"nid": 5678, "name": "Bob Jones"},
                {"external_id": "42", "display_name": "Carol"},
                {"name": "No Id"}
            ]"#,
        );
        let lookup = load(&path).unwrap();

        assert_eq!(lookup.display_name("1234"), Some("Alice Smith"));
        assert_eq!(lookup.person_id("1234"), Some("EMP-17"));
        assert_eq!(lookup.display_name("5678"), Some("Bob Jones"));
        assert_eq!(lookup.person_id("5678"), None);
        assert_eq!(lookup.display_name("42"), Some("Carol"));
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn test_later_record_wins() {
        let (_dir, path) = write_lookup(
            r#"[{"nid": "1", "name": "First"}, {"nid": "1", "name": "Second"}]"#,
        );
        assert_eq!(load(&path).unwrap().display_name("1"), Some("Second"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(LookupLoadError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let (_dir, path) = write_lookup(r#"{"nid": "1"}"#);
        assert!(matches!(load(&path), Err(LookupLoadError::Parse { .. })));
    }

    #[test]
    fn test_load_or_empty_degrades() {
        let (_dir, path) = write_lookup("not json");
        assert!(load_or_empty(Some(&path)).is_empty());
        assert!(load_or_empty(None).is_empty());
    }
}
