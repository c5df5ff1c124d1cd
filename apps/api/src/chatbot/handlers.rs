use axum::{extract::State, Json};

use crate::chatbot::service::{answer_question, ChatRequest, ChatResponse};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    Ok(Json(answer_question(&state.db, &state.chat_history, req).await?))
}
