//! Document workspace: the uploaded-file namespace consumed as generation
//! input material.
//!
//! Operations are scoped to a caller-supplied directory (the caller is
//! trusted to name a workspace it may use); when no path is given the
//! configured default applies. No locking is provided against a generation
//! task reading the same path — callers wanting a consistent snapshot must
//! not mutate the workspace while a job reading it is in flight.

use crate::error::ApiError;
use crate::models::DocumentEntry;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct DocumentWorkspace {
    default_path: PathBuf,
}

impl DocumentWorkspace {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    fn resolve(&self, path: Option<&str>) -> PathBuf {
        match path {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => self.default_path.clone(),
        }
    }

    /// Strip path separators, null bytes, and traversal sequences from an
    /// uploaded filename. The directory part is caller-trusted; the filename
    /// is not.
    pub fn sanitize_filename(filename: &str) -> String {
        let sanitized: String = filename
            .chars()
            .filter(|c| !['/', '\\', '\0'].contains(c))
            .take(200)
            .collect();
        sanitized.replace("..", "")
    }

    /// List the regular files at `path` as metadata entries, sorted by
    /// filename.
    pub async fn list(&self, path: Option<&str>) -> Result<Vec<DocumentEntry>, ApiError> {
        let dir = self.resolve(path);
        let shown_path = dir.to_string_lossy().to_string();

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            let modified_at: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            let content_type = mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string();

            entries.push(DocumentEntry {
                filename,
                path: shown_path.clone(),
                size: metadata.len(),
                content_type,
                modified_at,
            });
        }

        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(entries)
    }

    /// Write a file into the workspace, overwriting any existing file with
    /// the same name.
    pub async fn put(
        &self,
        path: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> Result<DocumentEntry, ApiError> {
        let filename = Self::sanitize_filename(filename);
        if filename.is_empty() {
            return Err(ApiError::InvalidRequest("empty filename".to_string()));
        }

        let dir = self.resolve(path);
        fs::create_dir_all(&dir).await?;

        let file_path = dir.join(&filename);
        fs::write(&file_path, bytes).await?;

        log::debug!("Stored document {:?} ({} bytes)", file_path, bytes.len());

        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(DocumentEntry {
            filename,
            path: dir.to_string_lossy().to_string(),
            size: bytes.len() as u64,
            content_type,
            modified_at: Utc::now(),
        })
    }

    /// Delete a file from the workspace.
    pub async fn delete(&self, path: Option<&str>, filename: &str) -> Result<(), ApiError> {
        let filename = Self::sanitize_filename(filename);
        let file_path = self.resolve(path).join(&filename);

        if !file_path.is_file() {
            return Err(ApiError::NotFound(format!("document '{}'", filename)));
        }

        fs::remove_file(&file_path).await?;
        log::debug!("Deleted document {:?}", file_path);
        Ok(())
    }

    /// Concatenate workspace documents into a bounded excerpt block for the
    /// generation prompt. Files are read in listing order until the byte
    /// budget runs out; non-UTF-8 content is included lossily.
    pub async fn read_corpus(
        &self,
        path: Option<&str>,
        max_bytes: usize,
    ) -> Result<String, ApiError> {
        let dir = self.resolve(path);
        let mut corpus = String::new();
        let mut remaining = max_bytes;

        for entry in self.list(path).await? {
            if remaining == 0 {
                break;
            }

            let bytes = fs::read(dir.join(&entry.filename)).await?;
            let text = String::from_utf8_lossy(&bytes);

            // Cut on a char boundary at or below the remaining budget.
            let mut end = text.len().min(remaining);
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            let excerpt = &text[..end];

            corpus.push_str(&format!("--- {} ---\n{}\n", entry.filename, excerpt));
            remaining = remaining.saturating_sub(excerpt.len());
        }

        Ok(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(temp_dir: &TempDir) -> DocumentWorkspace {
        DocumentWorkspace::new(temp_dir.path().join("my-docs"))
    }

    #[tokio::test]
    async fn test_put_then_list_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);

        ws.put(None, "notes.md", b"# Notes").await.unwrap();

        let entries = ws.list(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "notes.md");
        assert_eq!(entries[0].size, 7);
        assert_eq!(entries[0].content_type, "text/markdown");
    }

    #[tokio::test]
    async fn test_put_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);

        ws.put(None, "notes.md", b"old").await.unwrap();
        ws.put(None, "notes.md", b"newer content").await.unwrap();

        let entries = ws.list(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 13);
    }

    #[tokio::test]
    async fn test_delete_then_list_is_gone() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);

        ws.put(None, "a.txt", b"a").await.unwrap();
        ws.put(None, "b.txt", b"b").await.unwrap();
        ws.delete(None, "a.txt").await.unwrap();

        let entries = ws.list(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "b.txt");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);

        assert!(matches!(
            ws.delete(None, "ghost.txt").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        assert!(ws.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caller_path_overrides_default() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let other = temp_dir.path().join("other-docs");
        let other_str = other.to_string_lossy().to_string();

        ws.put(Some(&other_str), "x.txt", b"x").await.unwrap();

        assert!(ws.list(None).await.unwrap().is_empty());
        assert_eq!(ws.list(Some(&other_str)).await.unwrap().len(), 1);
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(
            DocumentWorkspace::sanitize_filename("../../etc/passwd"),
            "etcpasswd"
        );
        assert_eq!(DocumentWorkspace::sanitize_filename("ok-name.pdf"), "ok-name.pdf");
        assert_eq!(DocumentWorkspace::sanitize_filename("a/b\\c.txt"), "abc.txt");
    }

    #[tokio::test]
    async fn test_read_corpus_is_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);

        ws.put(None, "a.txt", b"aaaaaaaaaa").await.unwrap();
        ws.put(None, "b.txt", b"bbbbbbbbbb").await.unwrap();

        let corpus = ws.read_corpus(None, 10).await.unwrap();
        assert!(corpus.contains("a.txt"));
        // Budget exhausted before the second file's content.
        assert!(!corpus.contains("bbbbbbbbbb"));
    }
}
