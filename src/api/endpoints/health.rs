//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{AssistantMode, View};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub view: View,
    pub assistant: AssistantMode,
}

/// `GET /api/health`: connection check for the UI.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let snapshot = ctx.core.snapshot()?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        view: snapshot.view,
        assistant: ctx.core.config().assistant_mode,
    }))
}
