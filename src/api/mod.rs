//! Local HTTP API for the browser UI.
//!
//! Mirrors the `CoreState` operations one-to-one. `intake_api_router()`
//! returns a `Router` that can be mounted on any axum server.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::intake_api_router;
pub use server::{start_api_server, ApiServer, ApiServerInfo, ServerError};
pub use types::ApiContext;
