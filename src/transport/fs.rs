use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::constants::files::{DAY_FILE_EXTENSION, DAY_FILE_PREFIX};
use crate::errors::TallyError;
use crate::types::UnitId;

/// Read and decode one JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TallyError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// True if the file name looks like `day_*.json` (extension is case-insensitive).
pub fn is_day_file(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(DAY_FILE_PREFIX))
        .unwrap_or(false);
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(DAY_FILE_EXTENSION))
        .unwrap_or(false);
    has_prefix && has_extension
}

/// Day files below `root`, as unit ids relative to `root`, sorted by path.
///
/// Unit ids use `/` separators so they can be joined back onto `root`.
pub fn scan_day_files(root: &Path, follow_links: bool) -> Vec<UnitId> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(follow_links)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_day_file(entry.path()))
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .map(|relative| {
            relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}
