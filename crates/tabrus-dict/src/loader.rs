use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use tabrus_core::error::{Error, Result};
use tabrus_core::types::DictionaryEntry;

/// Accepted file layouts: a bare array of entries, or `{"entries": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DictionaryFile {
    Entries(Vec<DictionaryEntry>),
    Wrapped { entries: Vec<DictionaryEntry> },
}

/// Load entries from a JSON file, or from every `*.json` under a directory
/// (sorted by path, so ids and ordering are stable across runs).
pub fn load_entries(path: &Path) -> Result<Vec<DictionaryEntry>> {
    if !path.exists() {
        return Err(Error::DictionaryUnavailable(format!("{} does not exist", path.display())));
    }
    let files = if path.is_dir() { list_json_files(path) } else { vec![path.to_path_buf()] };
    let mut entries = Vec::new();
    for file in &files {
        let raw = fs::read_to_string(file).map_err(|e| Error::DictionaryUnavailable(format!("{}: {}", file.display(), e)))?;
        let parsed: DictionaryFile =
            serde_json::from_str(&raw).map_err(|e| Error::DictionaryUnavailable(format!("{}: {}", file.display(), e)))?;
        match parsed {
            DictionaryFile::Entries(list) | DictionaryFile::Wrapped { entries: list } => entries.extend(list),
        }
    }
    info!(files = files.len(), entries = entries.len(), path = %path.display(), "dictionary files loaded");
    Ok(entries)
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut json_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    json_files.sort();
    json_files
}
