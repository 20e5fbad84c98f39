//! Chat endpoints: per-report transcripts and the stateless ad-hoc chat.

use super::parse_body;
use crate::error::ApiError;
use crate::models::{
    AdHocChatRequest, AdHocChatResponse, ChatTurn, ChatTurnRequest, MessageRole,
};
use crate::server::ServerAppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct PostTurnResponse {
    /// The turn(s) appended by this call: one for a plain append, a
    /// user/assistant pair when the engine answered.
    pub turns: Vec<ChatTurn>,
}

/// GET /api/reports/:id/chat
pub async fn get_transcript(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let messages = state.chat_service.transcript(&id)?;
    Ok(Json(TranscriptResponse { messages }))
}

/// POST /api/reports/:id/chat
///
/// A user turn is answered by the chat engine: the question and the produced
/// assistant turn are appended atomically and both returned. An assistant
/// turn (a client recording an exchange it already has) is appended as-is.
pub async fn post_turn(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<PostTurnResponse>, ApiError> {
    let request: ChatTurnRequest = parse_body(body)?;

    let turns = match request.role {
        MessageRole::User => {
            let (user, assistant) = state.chat_service.ask(&id, request.content).await?;
            vec![user, assistant]
        }
        MessageRole::Assistant => {
            let turn =
                state
                    .chat_service
                    .append_turn(&id, MessageRole::Assistant, request.content)?;
            vec![turn]
        }
    };

    Ok(Json(PostTurnResponse { turns }))
}

/// POST /api/chat — answer over caller-supplied report text and history.
pub async fn adhoc_chat(
    State(state): State<ServerAppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AdHocChatResponse>, ApiError> {
    let request: AdHocChatRequest = parse_body(body)?;

    let content = state
        .chat_service
        .answer_adhoc(&request.report, &request.messages)
        .await?;

    Ok(Json(AdHocChatResponse {
        role: MessageRole::Assistant,
        content,
    }))
}
