//! Local API router for the browser UI.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! CORS is permissive: the UI is served from a different local origin.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Upper bound on a prescription upload, multipart overhead included.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the intake API router.
pub fn intake_api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/session", get(endpoints::session::snapshot))
        .route("/session/reset", post(endpoints::session::reset))
        .route("/intake", post(endpoints::intake::submit))
        .route("/chat/open", post(endpoints::chat::open))
        .route("/chat/close", post(endpoints::chat::close))
        .route("/chat/messages", post(endpoints::chat::send))
        .route("/chat/suggestions", get(endpoints::chat::suggestions))
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}
