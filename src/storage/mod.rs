//! File-backed storage for reports, chat transcripts, and the document
//! workspace.
//!
//! Reports are stored in `{data_dir}/reports/{id}.json`, transcripts in
//! `{data_dir}/chats/{id}.json`. Both stores keep an in-memory index and
//! write through to disk atomically, so a restart reloads the same state.

mod chats;
mod documents;
mod reports;

pub use chats::ChatStore;
pub use documents::DocumentWorkspace;
pub use reports::ReportStore;

use std::fs;
use std::path::Path;

/// Result type for low-level file operations.
pub type FileResult<T> = Result<T, String>;

/// Ensure a directory exists, creating parents as needed.
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {:?}: {}", path, e))?;
    }
    Ok(())
}

/// Write content atomically: write to a temp file, then rename over the
/// target. Readers never observe a partially-written file.
pub fn atomic_write(path: &Path, content: &str) -> FileResult<()> {
    let tmp_path = path.with_extension("tmp");

    fs::write(&tmp_path, content)
        .map_err(|e| format!("Failed to write temp file {:?}: {}", tmp_path, e))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| format!("Failed to rename {:?} to {:?}: {}", tmp_path, path, e))
}

/// Read and deserialize a JSON file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> FileResult<T> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))
}

/// Serialize and atomically write a value as pretty JSON.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> FileResult<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize {:?}: {}", path, e))?;

    atomic_write(path, &content)
}
