//! Chat endpoints.
//!
//! - `POST /api/chat/open` / `POST /api/chat/close`: enter or leave the chat view
//! - `POST /api/chat/messages`: send a message, returns the assistant reply
//! - `GET /api/chat/suggestions`: quick questions for the empty state

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::chat::PromptSuggestion;
use crate::core_state::SessionSnapshot;
use crate::models::Message;

#[derive(Deserialize)]
pub struct ChatSendRequest {
    pub text: String,
}

/// `POST /api/chat/open`
pub async fn open(State(ctx): State<ApiContext>) -> Result<Json<SessionSnapshot>, ApiError> {
    ctx.core.open_chat()?;
    Ok(Json(ctx.core.snapshot()?))
}

/// `POST /api/chat/close`
pub async fn close(State(ctx): State<ApiContext>) -> Result<Json<SessionSnapshot>, ApiError> {
    ctx.core.close_chat()?;
    Ok(Json(ctx.core.snapshot()?))
}

/// `POST /api/chat/messages`
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatSendRequest>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(ctx.core.send_message(&req.text).await?))
}

/// `GET /api/chat/suggestions`
pub async fn suggestions(State(ctx): State<ApiContext>) -> Json<Vec<PromptSuggestion>> {
    Json(ctx.core.chat_suggestions())
}
