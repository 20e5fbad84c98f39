// Report models: the persisted record of one research request and its outcome

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Enumerations
// ============================================================================

/// Lifecycle status of a report.
///
/// Transitions are strictly `pending -> running -> {completed|failed}`;
/// a report never skips `running` and never leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Running => "running",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }
}

impl Default for ReportStatus {
    fn default() -> Self {
        ReportStatus::Pending
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    ResearchReport,
    ResourceReport,
    OutlineReport,
    CustomReport,
    SubtopicReport,
    DetailedReport,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::ResearchReport => "research_report",
            ReportType::ResourceReport => "resource_report",
            ReportType::OutlineReport => "outline_report",
            ReportType::CustomReport => "custom_report",
            ReportType::SubtopicReport => "subtopic_report",
            ReportType::DetailedReport => "detailed_report",
        }
    }
}

impl Default for ReportType {
    fn default() -> Self {
        ReportType::ResearchReport
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the generation procedure draws its source material from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// External knowledge sources only.
    Web,
    /// Uploaded workspace documents only.
    Local,
    /// Both.
    Hybrid,
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSource::Web => "web",
            ReportSource::Local => "local",
            ReportSource::Hybrid => "hybrid",
        }
    }

    /// Whether the workspace documents participate in generation.
    pub fn uses_documents(&self) -> bool {
        matches!(self, ReportSource::Local | ReportSource::Hybrid)
    }
}

impl Default for ReportSource {
    fn default() -> Self {
        ReportSource::Web
    }
}

impl std::fmt::Display for ReportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Writing tone requested for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Objective,
    Formal,
    Analytical,
    Persuasive,
    Informative,
    Explanatory,
    Descriptive,
    Casual,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Objective => "objective",
            Tone::Formal => "formal",
            Tone::Analytical => "analytical",
            Tone::Persuasive => "persuasive",
            Tone::Informative => "informative",
            Tone::Explanatory => "explanatory",
            Tone::Descriptive => "descriptive",
            Tone::Casual => "casual",
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Objective
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Report
// ============================================================================

/// A research report: the materialized state of one generation job.
///
/// Invariant: `content` is `Some` only when completed, `error` only when
/// failed; neither while pending or running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier, assigned at creation, never reused.
    pub id: String,
    /// Original free-text research query. Immutable.
    pub task: String,
    pub report_type: ReportType,
    pub report_source: ReportSource,
    pub tone: Tone,
    /// Repository context forwarded to the generation procedure.
    pub repo_name: String,
    pub branch_name: String,
    #[serde(default)]
    pub status: ReportStatus,
    /// Result text; present only when completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Failure description; present only when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Create a new pending report from a validated submission.
    pub fn new(id: String, request: &CreateReportRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            task: request.task.clone(),
            report_type: request.report_type,
            report_source: request.report_source,
            tone: request.tone,
            repo_name: request.repo_name.clone(),
            branch_name: request.branch_name.clone(),
            status: ReportStatus::Pending,
            content: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to `running`. Only valid from `pending`.
    pub fn mark_running(&mut self) {
        self.status = ReportStatus::Running;
        self.updated_at = Utc::now();
    }

    /// Record the generated text and transition to `completed`.
    pub fn complete(&mut self, content: String) {
        self.status = ReportStatus::Completed;
        self.content = Some(content);
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Record a terminal generation failure.
    pub fn fail(&mut self, error: String) {
        self.status = ReportStatus::Failed;
        self.error = Some(error);
        self.content = None;
        self.updated_at = Utc::now();
    }

    /// Minimal listing view of this report.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id.clone(),
            task: self.task.clone(),
            report_type: self.report_type,
            report_source: self.report_source,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing view: everything a report index needs, without the content body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub task: String,
    pub report_type: ReportType,
    pub report_source: ReportSource,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// API Request/Response Types
// ============================================================================

fn default_repo_name() -> String {
    "default".to_string()
}

fn default_branch_name() -> String {
    "main".to_string()
}

fn default_generate_in_background() -> bool {
    true
}

/// Submission payload for a new research report.
///
/// Unknown fields are rejected rather than ignored, so typos in the
/// enumerated configuration surface as 400s instead of silently picking
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    /// The research task/query. Must be non-empty.
    pub task: String,
    #[serde(default)]
    pub report_type: ReportType,
    #[serde(default)]
    pub report_source: ReportSource,
    #[serde(default)]
    pub tone: Tone,
    /// Extra headers forwarded verbatim to the generation procedure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default = "default_repo_name")]
    pub repo_name: String,
    #[serde(default = "default_branch_name")]
    pub branch_name: String,
    /// When false, the submitting call blocks until the job is terminal.
    #[serde(default = "default_generate_in_background")]
    pub generate_in_background: bool,
}

/// Partial update for an existing report.
///
/// Only content and repository metadata are externally mutable. `status`
/// and the immutable creation fields are declared here so that attempts to
/// set them produce a 403 instead of a generic unknown-field rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,

    // Rejected when present: status is owned by the orchestrator task,
    // the rest are immutable after creation.
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub task: Option<serde_json::Value>,
    #[serde(default)]
    pub report_type: Option<serde_json::Value>,
    #[serde(default)]
    pub report_source: Option<serde_json::Value>,
    #[serde(default)]
    pub tone: Option<serde_json::Value>,
}

impl UpdateReportRequest {
    /// Name of the first disallowed field present, if any.
    pub fn forbidden_field(&self) -> Option<&'static str> {
        if self.status.is_some() {
            Some("status")
        } else if self.task.is_some() {
            Some("task")
        } else if self.report_type.is_some() {
            Some("report_type")
        } else if self.report_source.is_some() {
            Some("report_source")
        } else if self.tone.is_some() {
            Some("tone")
        } else {
            None
        }
    }

    /// Whether any mutable field is present.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.repo_name.is_none() && self.branch_name.is_none()
    }
}

/// Response to a report submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportResponse {
    pub research_id: String,
    pub message: String,
    /// The terminal report, present only for synchronous submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(task: &str) -> CreateReportRequest {
        serde_json::from_value(serde_json::json!({ "task": task })).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let req = request("What is Rust?");
        assert_eq!(req.report_type, ReportType::ResearchReport);
        assert_eq!(req.report_source, ReportSource::Web);
        assert_eq!(req.tone, Tone::Objective);
        assert_eq!(req.repo_name, "default");
        assert_eq!(req.branch_name, "main");
        assert!(req.generate_in_background);
    }

    #[test]
    fn test_request_rejects_unknown_fields() {
        let result: Result<CreateReportRequest, _> = serde_json::from_value(serde_json::json!({
            "task": "x",
            "report_typ": "research_report"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_request_rejects_out_of_enumeration() {
        let result: Result<CreateReportRequest, _> = serde_json::from_value(serde_json::json!({
            "task": "x",
            "tone": "sarcastic"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_report_lifecycle() {
        let mut report = Report::new("research-1".to_string(), &request("topic"));
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.content.is_none() && report.error.is_none());

        report.mark_running();
        assert_eq!(report.status, ReportStatus::Running);
        assert!(report.content.is_none() && report.error.is_none());

        report.complete("# Findings".to_string());
        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.content.as_deref(), Some("# Findings"));
        assert!(report.error.is_none());
        assert!(report.status.is_terminal());
    }

    #[test]
    fn test_report_failure_clears_content() {
        let mut report = Report::new("research-1".to_string(), &request("topic"));
        report.mark_running();
        report.fail("upstream timeout".to_string());
        assert_eq!(report.status, ReportStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("upstream timeout"));
        assert!(report.content.is_none());
    }

    #[test]
    fn test_update_forbidden_field_detection() {
        let update: UpdateReportRequest =
            serde_json::from_value(serde_json::json!({ "status": "completed" })).unwrap();
        assert_eq!(update.forbidden_field(), Some("status"));

        let update: UpdateReportRequest =
            serde_json::from_value(serde_json::json!({ "task": "new task" })).unwrap();
        assert_eq!(update.forbidden_field(), Some("task"));

        let update: UpdateReportRequest =
            serde_json::from_value(serde_json::json!({ "content": "edited" })).unwrap();
        assert_eq!(update.forbidden_field(), None);
        assert!(!update.is_empty());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ReportStatus::Completed).unwrap(),
            serde_json::json!("completed")
        );
        assert_eq!(
            serde_json::to_value(ReportType::DetailedReport).unwrap(),
            serde_json::json!("detailed_report")
        );
    }
}
