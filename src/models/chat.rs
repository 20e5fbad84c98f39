// Chat models: per-report transcripts and the ad-hoc chat payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One turn in a report's transcript.
///
/// `sequence` is 1-based and strictly increasing per report, assigned by the
/// chat store under its write lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: String, sequence: u64) -> Self {
        Self {
            role,
            content,
            sequence,
            created_at: Utc::now(),
        }
    }
}

/// Payload for posting a turn to a report's transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatTurnRequest {
    pub role: MessageRole,
    pub content: String,
}

/// A caller-supplied message in an ad-hoc chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomingMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Ad-hoc chat request: report text plus conversation history, nothing stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdHocChatRequest {
    /// The report text to ground the answer in.
    pub report: String,
    /// Conversation so far; the final user message is the question.
    pub messages: Vec<IncomingMessage>,
}

/// Assistant reply for the ad-hoc chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdHocChatResponse {
    pub role: MessageRole,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(
            serde_json::to_value(MessageRole::Assistant).unwrap(),
            serde_json::json!("assistant")
        );
        let role: MessageRole = serde_json::from_value(serde_json::json!("user")).unwrap();
        assert_eq!(role, MessageRole::User);
    }

    #[test]
    fn test_turn_request_rejects_unknown_role() {
        let result: Result<ChatTurnRequest, _> = serde_json::from_value(serde_json::json!({
            "role": "system",
            "content": "hi"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_adhoc_request_shape() {
        let req: AdHocChatRequest = serde_json::from_value(serde_json::json!({
            "report": "# Report",
            "messages": [
                { "role": "user", "content": "What is this about?" }
            ]
        }))
        .unwrap();
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, MessageRole::User);
    }
}
