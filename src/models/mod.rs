//! Data model shared across the stores, orchestrator, and HTTP surface.

mod chat;
mod report;

pub use chat::{
    AdHocChatRequest, AdHocChatResponse, ChatTurn, ChatTurnRequest, IncomingMessage, MessageRole,
};
pub use report::{
    CreateReportRequest, CreateReportResponse, Report, ReportSource, ReportStatus, ReportSummary,
    ReportType, Tone, UpdateReportRequest,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one file in the document workspace.
///
/// Content bytes are not carried here; listings are metadata-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    /// The workspace directory the entry was listed from, as supplied.
    pub path: String,
    pub size: u64,
    pub content_type: String,
    pub modified_at: DateTime<Utc>,
}

/// Result of a workspace upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub filename: String,
    pub path: String,
    pub size: u64,
}

/// Generic status message body for deletes and similar operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
