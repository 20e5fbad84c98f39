//! Chat engine: grounded follow-up conversations over completed reports.
//!
//! Owns transcript threading and context assembly only; producing the
//! actual assistant text is delegated to the external [`ChatResponder`].

use crate::error::ApiError;
use crate::generation::ChatResponder;
use crate::models::{ChatTurn, IncomingMessage, MessageRole, Report, ReportStatus};
use crate::storage::{ChatStore, ReportStore};
use std::sync::Arc;

/// Most-recent transcript turns included in the responder prompt.
pub const MAX_CONTEXT_TURNS: usize = 12;

/// Upper bound on report text included in the responder prompt.
pub const MAX_REPORT_CONTEXT_CHARS: usize = 24_000;

pub struct ChatService {
    reports: Arc<ReportStore>,
    chats: Arc<ChatStore>,
    responder: Arc<dyn ChatResponder>,
}

impl ChatService {
    pub fn new(
        reports: Arc<ReportStore>,
        chats: Arc<ChatStore>,
        responder: Arc<dyn ChatResponder>,
    ) -> Self {
        Self {
            reports,
            chats,
            responder,
        }
    }

    /// Chat requires completed content: unknown ids are `NotFound`, reports
    /// that are not (yet) completed are `NotReady`.
    fn completed_report(&self, report_id: &str) -> Result<Report, ApiError> {
        let report = self.reports.get(report_id)?;
        match report.status {
            ReportStatus::Completed => Ok(report),
            ReportStatus::Pending | ReportStatus::Running => Err(ApiError::NotReady(format!(
                "report '{}' is still {}",
                report_id, report.status
            ))),
            ReportStatus::Failed => Err(ApiError::NotReady(format!(
                "report '{}' failed and has no content",
                report_id
            ))),
        }
    }

    /// Ordered transcript for a stored report.
    pub fn transcript(&self, report_id: &str) -> Result<Vec<ChatTurn>, ApiError> {
        if !self.reports.contains(report_id) {
            return Err(ApiError::NotFound(format!("report '{}'", report_id)));
        }
        Ok(self.chats.transcript(report_id))
    }

    /// Append a single caller-supplied turn without invoking the responder.
    pub fn append_turn(
        &self,
        report_id: &str,
        role: MessageRole,
        content: String,
    ) -> Result<ChatTurn, ApiError> {
        self.completed_report(report_id)?;
        self.chats.append(report_id, role, content)
    }

    /// Answer a user question about a stored report.
    ///
    /// Assembles the bounded context, awaits the responder, then records
    /// the question and answer as one atomic exchange. Returns both turns.
    pub async fn ask(
        &self,
        report_id: &str,
        question: String,
    ) -> Result<(ChatTurn, ChatTurn), ApiError> {
        let report = self.completed_report(report_id)?;
        let report_text = report.content.unwrap_or_default();

        let transcript = self.chats.transcript(report_id);
        let recent: Vec<(MessageRole, String)> = transcript
            .iter()
            .rev()
            .take(MAX_CONTEXT_TURNS)
            .rev()
            .map(|t| (t.role, t.content.clone()))
            .collect();

        let prompt = build_prompt(&report_text, &recent, &question);
        let answer = self
            .responder
            .respond(prompt)
            .await
            .map_err(ApiError::Generation)?;

        self.chats.append_exchange(report_id, question, answer)
    }

    /// The stateless chat path: caller supplies report text and history,
    /// nothing is stored.
    pub async fn answer_adhoc(
        &self,
        report_text: &str,
        messages: &[IncomingMessage],
    ) -> Result<String, ApiError> {
        let (question, history) = match messages.split_last() {
            Some((last, rest)) if last.role == MessageRole::User => (&last.content, rest),
            _ => {
                return Err(ApiError::InvalidRequest(
                    "messages must end with a user message".to_string(),
                ))
            }
        };

        let recent: Vec<(MessageRole, String)> = history
            .iter()
            .rev()
            .take(MAX_CONTEXT_TURNS)
            .rev()
            .map(|m| (m.role, m.content.clone()))
            .collect();

        let prompt = build_prompt(report_text, &recent, question);
        self.responder
            .respond(prompt)
            .await
            .map_err(ApiError::Generation)
    }
}

/// Assemble the responder prompt: truncated report text, recent turns, and
/// the new question.
fn build_prompt(report_text: &str, recent: &[(MessageRole, String)], question: &str) -> String {
    let mut end = report_text.len().min(MAX_REPORT_CONTEXT_CHARS);
    while end > 0 && !report_text.is_char_boundary(end) {
        end -= 1;
    }

    let mut prompt = String::new();
    prompt.push_str("You are answering questions about the following research report.\n\n");
    prompt.push_str(&report_text[..end]);
    prompt.push_str("\n\nConversation so far:\n");

    for (role, content) in recent {
        prompt.push_str(&format!("{}: {}\n", role, content));
    }

    prompt.push_str(&format!("user: {}\nassistant:", question));
    prompt
}
