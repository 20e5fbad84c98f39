//! Job orchestrator: admits generation requests, runs them as background
//! tasks, and keeps the report store in step with each task's lifecycle.
//!
//! Each submission gets a fresh id, so at most one generation task ever
//! writes to a given report. Deleting a report while its task is running
//! detaches the task: the handle is dropped from the registry (the task is
//! not aborted mid-flight) and its terminal write is discarded by the store.

use crate::error::ApiError;
use crate::generation::{GenerationContext, ResearchGenerator};
use crate::models::{CreateReportRequest, Report};
use crate::storage::{ChatStore, DocumentWorkspace, ReportStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Outcome of a submission: background mode returns the id immediately,
/// synchronous mode returns the terminal report.
#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted { research_id: String },
    Completed { report: Report },
}

pub struct Orchestrator {
    reports: Arc<ReportStore>,
    chats: Arc<ChatStore>,
    documents: Arc<DocumentWorkspace>,
    generator: Arc<dyn ResearchGenerator>,
    /// In-flight generation tasks keyed by report id.
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        reports: Arc<ReportStore>,
        chats: Arc<ChatStore>,
        documents: Arc<DocumentWorkspace>,
        generator: Arc<dyn ResearchGenerator>,
    ) -> Self {
        Self {
            reports,
            chats,
            documents,
            generator,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Admit a generation request.
    ///
    /// Validates the request, allocates a fresh id, records a pending
    /// report, and either spawns the generation task (background mode) or
    /// drives it to completion inline (synchronous mode; the report stays
    /// stored and pollable either way).
    pub async fn submit(
        self: &Arc<Self>,
        request: CreateReportRequest,
    ) -> Result<SubmitOutcome, ApiError> {
        if request.task.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "task must not be empty".to_string(),
            ));
        }

        let research_id = format!("research-{}", Uuid::new_v4());
        let report = Report::new(research_id.clone(), &request);
        self.reports.create(report)?;

        let ctx = GenerationContext {
            task: request.task,
            report_type: request.report_type,
            report_source: request.report_source,
            tone: request.tone,
            headers: request.headers,
            repo_name: request.repo_name,
            branch_name: request.branch_name,
            workspace: self.documents.clone(),
        };

        if request.generate_in_background {
            let orchestrator = self.clone();
            let id = research_id.clone();
            let handle = tokio::spawn(async move {
                orchestrator.run_generation(&id, ctx).await;
            });

            let mut tasks = self.tasks.lock().expect("task registry lock poisoned");
            // Drop registry entries for tasks that already finished.
            tasks.retain(|_, h| !h.is_finished());
            tasks.insert(research_id.clone(), handle);

            log::info!("Accepted research job {} (background)", research_id);
            Ok(SubmitOutcome::Accepted { research_id })
        } else {
            log::info!("Running research job {} synchronously", research_id);
            self.run_generation(&research_id, ctx).await;

            let report = self.reports.get(&research_id)?;
            Ok(SubmitOutcome::Completed { report })
        }
    }

    /// Drive one generation to its terminal state. Failures are recorded on
    /// the report, never returned to the submitter; there is no retry.
    async fn run_generation(&self, id: &str, ctx: GenerationContext) {
        self.reports.mark_running(id);

        match self.generator.generate(ctx).await {
            Ok(content) => {
                log::info!("Research job {} completed ({} bytes)", id, content.len());
                self.reports.complete(id, content);
            }
            Err(error) => {
                log::warn!("Research job {} failed: {}", id, error);
                self.reports.fail(id, error);
            }
        }
    }

    /// Current state of a report.
    pub fn get_status(&self, id: &str) -> Result<Report, ApiError> {
        self.reports.get(id)
    }

    /// Delete a report: removes it from the store, detaches any in-flight
    /// task, and cascade-deletes the chat transcript.
    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.reports.delete(id)?;

        let detached = {
            let mut tasks = self.tasks.lock().expect("task registry lock poisoned");
            tasks.retain(|_, h| !h.is_finished());
            tasks.remove(id)
        };
        if let Some(handle) = detached {
            // The task keeps running; its terminal write will be dropped by
            // the store. In-flight external calls are not interrupted.
            drop(handle);
            log::info!("Detached running generation task for deleted report {}", id);
        }

        self.chats.remove(id)?;
        log::info!("Deleted report {}", id);
        Ok(())
    }

    /// Number of tracked, unfinished generation tasks.
    pub fn active_task_count(&self) -> usize {
        let tasks = self.tasks.lock().expect("task registry lock poisoned");
        tasks.values().filter(|h| !h.is_finished()).count()
    }
}
