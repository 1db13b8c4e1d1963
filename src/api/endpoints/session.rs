//! Session endpoints.
//!
//! - `GET /api/session`: current view, in-flight flag, outcome, transcript
//! - `POST /api/session/reset`: back to a blank upload view

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::SessionSnapshot;

/// `GET /api/session`
pub async fn snapshot(State(ctx): State<ApiContext>) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(ctx.core.snapshot()?))
}

/// `POST /api/session/reset`
pub async fn reset(State(ctx): State<ApiContext>) -> Result<Json<SessionSnapshot>, ApiError> {
    ctx.core.start_upload()?;
    Ok(Json(ctx.core.snapshot()?))
}
