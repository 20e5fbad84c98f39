//! Report store: durable id -> report mapping with per-identifier
//! linearizability.
//!
//! The in-memory map is the source of truth while the process runs; every
//! mutation writes through to `{data_dir}/reports/{id}.json` before the
//! write lock is released, so operations on the same id are never observed
//! partially applied. Reads of different identifiers proceed concurrently
//! under the read lock.

use super::{ensure_dir, read_json, write_json};
use crate::error::ApiError;
use crate::models::{Report, ReportStatus, ReportSummary, UpdateReportRequest};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub struct ReportStore {
    dir: PathBuf,
    reports: RwLock<HashMap<String, Report>>,
}

impl ReportStore {
    /// Open the store rooted at `data_dir`, loading any persisted reports.
    pub fn open(data_dir: &Path) -> Result<Self, ApiError> {
        let dir = data_dir.join("reports");
        ensure_dir(&dir).map_err(ApiError::Storage)?;

        let mut reports = HashMap::new();
        let entries =
            fs::read_dir(&dir).map_err(|e| ApiError::Storage(format!("read {:?}: {}", dir, e)))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                match read_json::<Report>(&path) {
                    Ok(report) => {
                        reports.insert(report.id.clone(), report);
                    }
                    Err(e) => log::warn!("Skipping unreadable report file {:?}: {}", path, e),
                }
            }
        }

        if !reports.is_empty() {
            log::info!("Loaded {} persisted reports from {:?}", reports.len(), dir);
        }

        Ok(Self {
            dir,
            reports: RwLock::new(reports),
        })
    }

    fn report_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn persist(&self, report: &Report) -> Result<(), ApiError> {
        write_json(&self.report_path(&report.id), report).map_err(ApiError::Storage)
    }

    /// Insert a freshly-created report. The id must not already exist.
    pub fn create(&self, report: Report) -> Result<(), ApiError> {
        let mut reports = self.reports.write().expect("report store lock poisoned");

        if reports.contains_key(&report.id) {
            return Err(ApiError::Storage(format!(
                "report id collision: {}",
                report.id
            )));
        }

        self.persist(&report)?;
        reports.insert(report.id.clone(), report);
        Ok(())
    }

    /// Fetch a report by id.
    pub fn get(&self, id: &str) -> Result<Report, ApiError> {
        self.reports
            .read()
            .expect("report store lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("report '{}'", id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reports
            .read()
            .expect("report store lock poisoned")
            .contains_key(id)
    }

    /// List reports, optionally restricted to a set of ids, ordered by
    /// `created_at` descending (newest first). Unknown ids in the filter are
    /// silently skipped.
    pub fn list(&self, ids: Option<&[String]>) -> Vec<ReportSummary> {
        let reports = self.reports.read().expect("report store lock poisoned");

        let mut summaries: Vec<ReportSummary> = match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| reports.get(id))
                .map(Report::summary)
                .collect(),
            None => reports.values().map(Report::summary).collect(),
        };

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Apply a client update. Status and immutable fields are rejected
    /// upstream; per-field last-write-wins for the rest.
    pub fn update_fields(
        &self,
        id: &str,
        update: &UpdateReportRequest,
    ) -> Result<Report, ApiError> {
        let mut reports = self.reports.write().expect("report store lock poisoned");

        let report = reports
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(format!("report '{}'", id)))?;

        if let Some(content) = &update.content {
            report.content = Some(content.clone());
        }
        if let Some(repo_name) = &update.repo_name {
            report.repo_name = repo_name.clone();
        }
        if let Some(branch_name) = &update.branch_name {
            report.branch_name = branch_name.clone();
        }
        report.updated_at = Utc::now();

        let updated = report.clone();
        self.persist(&updated)?;
        Ok(updated)
    }

    /// Remove a report permanently. The id is never reused afterwards.
    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        let mut reports = self.reports.write().expect("report store lock poisoned");

        if reports.remove(id).is_none() {
            return Err(ApiError::NotFound(format!("report '{}'", id)));
        }

        let path = self.report_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| ApiError::Storage(format!("delete {:?}: {}", path, e)))?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Task-side status transitions.
    //
    // These are only called by the generation task bound to the report's
    // id. A write to an id that has been deleted in the meantime is
    // silently dropped: that is the detach guarantee for
    // delete-while-running.
    // ------------------------------------------------------------------

    pub(crate) fn mark_running(&self, id: &str) {
        self.transition(id, |report| {
            if report.status == ReportStatus::Pending {
                report.mark_running();
                true
            } else {
                log::warn!(
                    "Ignoring running transition for report {} in state {}",
                    report.id,
                    report.status
                );
                false
            }
        });
    }

    pub(crate) fn complete(&self, id: &str, content: String) {
        self.transition(id, |report| {
            if report.status == ReportStatus::Running {
                report.complete(content);
                true
            } else {
                log::warn!(
                    "Ignoring completion for report {} in state {}",
                    report.id,
                    report.status
                );
                false
            }
        });
    }

    pub(crate) fn fail(&self, id: &str, error: String) {
        self.transition(id, |report| {
            if report.status == ReportStatus::Running {
                report.fail(error);
                true
            } else {
                log::warn!(
                    "Ignoring failure for report {} in state {}",
                    report.id,
                    report.status
                );
                false
            }
        });
    }

    fn transition<F>(&self, id: &str, apply: F)
    where
        F: FnOnce(&mut Report) -> bool,
    {
        let mut reports = self.reports.write().expect("report store lock poisoned");

        let Some(report) = reports.get_mut(id) else {
            log::debug!("Dropping status write to deleted report {}", id);
            return;
        };

        if apply(report) {
            let snapshot = report.clone();
            if let Err(e) = self.persist(&snapshot) {
                log::warn!("Failed to persist report {}: {}", id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateReportRequest;
    use tempfile::TempDir;

    fn request(task: &str) -> CreateReportRequest {
        serde_json::from_value(serde_json::json!({ "task": task })).unwrap()
    }

    fn store(temp_dir: &TempDir) -> ReportStore {
        ReportStore::open(temp_dir.path()).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("topic")))
            .unwrap();

        let report = store.get("research-1").unwrap();
        assert_eq!(report.task, "topic");
        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(matches!(
            store.get("research-missing"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let mut first = Report::new("research-1".into(), &request("a"));
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        store.create(first).unwrap();
        store
            .create(Report::new("research-2".into(), &request("b")))
            .unwrap();

        let listed = store.list(None);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "research-2");
        assert_eq!(listed[1].id, "research-1");
    }

    #[test]
    fn test_list_with_filter_skips_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("a")))
            .unwrap();

        let filter = vec!["research-1".to_string(), "research-x".to_string()];
        let listed = store.list(Some(&filter));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "research-1");
    }

    #[test]
    fn test_update_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("a")))
            .unwrap();

        let update: UpdateReportRequest =
            serde_json::from_value(serde_json::json!({ "repo_name": "docs" })).unwrap();
        let updated = store.update_fields("research-1", &update).unwrap();
        assert_eq!(updated.repo_name, "docs");
        // Untouched fields keep their values.
        assert_eq!(updated.branch_name, "main");
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("a")))
            .unwrap();
        store.delete("research-1").unwrap();

        assert!(matches!(
            store.get("research-1"),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("research-1"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_transition_lifecycle_persists() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("a")))
            .unwrap();

        store.mark_running("research-1");
        assert_eq!(store.get("research-1").unwrap().status, ReportStatus::Running);

        store.complete("research-1", "# Done".into());
        let report = store.get("research-1").unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.content.as_deref(), Some("# Done"));

        // Reports survive a store reopen.
        drop(store);
        let reopened = ReportStore::open(temp_dir.path()).unwrap();
        let report = reopened.get("research-1").unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
    }

    #[test]
    fn test_completion_cannot_skip_running() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("a")))
            .unwrap();

        // Still pending: the completion write is dropped.
        store.complete("research-1", "early".into());
        assert_eq!(store.get("research-1").unwrap().status, ReportStatus::Pending);
    }

    #[test]
    fn test_write_to_deleted_id_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store
            .create(Report::new("research-1".into(), &request("a")))
            .unwrap();
        store.mark_running("research-1");
        store.delete("research-1").unwrap();

        // A detached task completing later must not resurrect the report.
        store.complete("research-1", "late result".into());
        assert!(matches!(
            store.get("research-1"),
            Err(ApiError::NotFound(_))
        ));
        assert!(!temp_dir
            .path()
            .join("reports")
            .join("research-1.json")
            .exists());
    }
}
