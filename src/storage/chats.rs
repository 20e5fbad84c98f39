//! Chat session store: ordered transcripts keyed by report id.
//!
//! Transcripts are stored in `{data_dir}/chats/{id}.json` and cascade-deleted
//! with their parent report. Sequence numbers are assigned under the write
//! lock, so appends for one report are strictly ordered by arrival with no
//! gaps.

use super::{ensure_dir, read_json, write_json};
use crate::error::ApiError;
use crate::models::{ChatTurn, MessageRole};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub struct ChatStore {
    dir: PathBuf,
    transcripts: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl ChatStore {
    /// Open the store rooted at `data_dir`, loading persisted transcripts.
    pub fn open(data_dir: &Path) -> Result<Self, ApiError> {
        let dir = data_dir.join("chats");
        ensure_dir(&dir).map_err(ApiError::Storage)?;

        let mut transcripts = HashMap::new();
        let entries =
            fs::read_dir(&dir).map_err(|e| ApiError::Storage(format!("read {:?}: {}", dir, e)))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match read_json::<Vec<ChatTurn>>(&path) {
                    Ok(turns) => {
                        transcripts.insert(stem.to_string(), turns);
                    }
                    Err(e) => log::warn!("Skipping unreadable transcript {:?}: {}", path, e),
                }
            }
        }

        Ok(Self {
            dir,
            transcripts: RwLock::new(transcripts),
        })
    }

    fn transcript_path(&self, report_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", report_id))
    }

    fn persist(&self, report_id: &str, turns: &[ChatTurn]) -> Result<(), ApiError> {
        write_json(&self.transcript_path(report_id), &turns).map_err(ApiError::Storage)
    }

    /// The ordered transcript for a report; empty when no turns exist yet.
    pub fn transcript(&self, report_id: &str) -> Vec<ChatTurn> {
        self.transcripts
            .read()
            .expect("chat store lock poisoned")
            .get(report_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append one turn, assigning the next sequence number. The write-through
    /// happens under the write lock, so disk never lags a later append.
    pub fn append(
        &self,
        report_id: &str,
        role: MessageRole,
        content: String,
    ) -> Result<ChatTurn, ApiError> {
        let mut transcripts = self.transcripts.write().expect("chat store lock poisoned");

        let turns = transcripts.entry(report_id.to_string()).or_default();
        let sequence = turns.last().map_or(1, |t| t.sequence + 1);
        let turn = ChatTurn::new(role, content, sequence);
        turns.push(turn.clone());

        if let Err(e) = self.persist(report_id, turns) {
            turns.pop();
            return Err(e);
        }
        Ok(turn)
    }

    /// Append a user question and its assistant answer in one critical
    /// section: both turns land with adjacent sequence numbers or neither
    /// is recorded.
    pub fn append_exchange(
        &self,
        report_id: &str,
        question: String,
        answer: String,
    ) -> Result<(ChatTurn, ChatTurn), ApiError> {
        let mut transcripts = self.transcripts.write().expect("chat store lock poisoned");

        let turns = transcripts.entry(report_id.to_string()).or_default();
        let next = turns.last().map_or(1, |t| t.sequence + 1);

        let user_turn = ChatTurn::new(MessageRole::User, question, next);
        let assistant_turn = ChatTurn::new(MessageRole::Assistant, answer, next + 1);

        turns.push(user_turn.clone());
        turns.push(assistant_turn.clone());

        if let Err(e) = self.persist(report_id, turns) {
            turns.truncate(turns.len() - 2);
            return Err(e);
        }

        Ok((user_turn, assistant_turn))
    }

    /// Remove a report's transcript. Missing transcripts are fine: the
    /// cascade from report deletion must be idempotent.
    pub fn remove(&self, report_id: &str) -> Result<(), ApiError> {
        let mut transcripts = self.transcripts.write().expect("chat store lock poisoned");
        transcripts.remove(report_id);
        drop(transcripts);

        let path = self.transcript_path(report_id);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| ApiError::Storage(format!("delete {:?}: {}", path, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_assigns_sequences_without_gaps() {
        let temp_dir = TempDir::new().unwrap();
        let store = ChatStore::open(temp_dir.path()).unwrap();

        let t1 = store
            .append("research-1", MessageRole::User, "first".into())
            .unwrap();
        let t2 = store
            .append("research-1", MessageRole::Assistant, "second".into())
            .unwrap();
        let t3 = store
            .append("research-1", MessageRole::User, "third".into())
            .unwrap();

        assert_eq!((t1.sequence, t2.sequence, t3.sequence), (1, 2, 3));

        let transcript = store.transcript("research-1");
        assert_eq!(transcript.len(), 3);
        for (i, turn) in transcript.iter().enumerate() {
            assert_eq!(turn.sequence, i as u64 + 1);
        }
    }

    #[test]
    fn test_transcripts_are_isolated_per_report() {
        let temp_dir = TempDir::new().unwrap();
        let store = ChatStore::open(temp_dir.path()).unwrap();

        store
            .append("research-1", MessageRole::User, "a".into())
            .unwrap();
        store
            .append("research-2", MessageRole::User, "b".into())
            .unwrap();

        assert_eq!(store.transcript("research-1").len(), 1);
        assert_eq!(store.transcript("research-2").len(), 1);
        // Both restart at sequence 1.
        assert_eq!(store.transcript("research-2")[0].sequence, 1);
    }

    #[test]
    fn test_append_exchange_is_adjacent() {
        let temp_dir = TempDir::new().unwrap();
        let store = ChatStore::open(temp_dir.path()).unwrap();

        store
            .append("research-1", MessageRole::User, "warmup".into())
            .unwrap();
        let (user, assistant) = store
            .append_exchange("research-1", "question".into(), "answer".into())
            .unwrap();

        assert_eq!(user.sequence, 2);
        assert_eq!(assistant.sequence, 3);
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(assistant.role, MessageRole::Assistant);
        assert_eq!(store.transcript("research-1").len(), 3);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = ChatStore::open(temp_dir.path()).unwrap();

        store
            .append("research-1", MessageRole::User, "a".into())
            .unwrap();
        store.remove("research-1").unwrap();
        assert!(store.transcript("research-1").is_empty());

        // Removing again (or removing a transcript that never existed) is fine.
        store.remove("research-1").unwrap();
        store.remove("research-unknown").unwrap();
    }

    #[test]
    fn test_transcripts_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = ChatStore::open(temp_dir.path()).unwrap();
            store
                .append("research-1", MessageRole::User, "persisted".into())
                .unwrap();
        }

        let reopened = ChatStore::open(temp_dir.path()).unwrap();
        let transcript = reopened.transcript("research-1");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, "persisted");
    }
}
