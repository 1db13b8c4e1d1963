pub mod api; // Local HTTP API for the UI
pub mod chat; // Pharmacist chat session
pub mod config;
pub mod core_state; // Transport-agnostic state
pub mod intake; // Upload → parse → verify ‖ screen → reconcile
pub mod models;
pub mod services; // Remote backend clients
pub mod view_state; // Upload / Details / Chat state machine

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Service(#[from] services::ServiceError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Load configuration, start the local API and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let config = config::AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::from_config(config)?);

    let server = api::start_api_server(core, bind_addr).await?;
    tracing::info!(addr = %server.info.server_addr, "Prescription intake API ready");

    let signal = tokio::signal::ctrl_c().await;
    server.stop().await;
    signal.map_err(StartupError::Signal)
}
