use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::models::{AssistantMode, MatchStrategy};

/// Application-level constants
pub const APP_NAME: &str = "Prescription Intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for every environment override.
pub const ENV_PREFIX: &str = "PRESCRIPTION_INTAKE_";

pub const UPLOAD_PATH: &str = "/api/v1/upload-prescription";
pub const VERIFY_DOCTOR_PATH: &str = "/api/v1/verify-doctor";
pub const MEDICINE_SAFETY_PATH: &str = "/api/v1/check-medicine-safety";
pub const CHAT_PATH: &str = "/api/v1/chat";

const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";
/// Parsing a scanned page can take a while on the backend.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SIMULATED_REPLY_MS: u64 = 1500;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "prescription_intake_lib=info,prescription_intake=info,tower_http=warn"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({detail})")]
    InvalidValue {
        key: String,
        value: String,
        detail: String,
    },
}

/// Runtime configuration: code defaults, overridden by environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the parsing / verification / safety backend.
    pub service_url: String,
    /// Transport timeout for every outbound request.
    pub request_timeout: Duration,
    /// Upper bound on each of the two concurrent verification calls.
    pub check_timeout: Duration,
    /// Where the local API for the UI listens.
    pub bind_addr: SocketAddr,
    pub assistant_mode: AssistantMode,
    pub simulated_reply_delay: Duration,
    pub match_strategy: MatchStrategy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            check_timeout: Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            assistant_mode: AssistantMode::Http,
            simulated_reply_delay: Duration::from_millis(DEFAULT_SIMULATED_REPLY_MS),
            match_strategy: MatchStrategy::ByName,
        }
    }
}

impl AppConfig {
    /// Load from process environment (`PRESCRIPTION_INTAKE_*`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        };

        let mut config = Self::default();

        if let Some((_, url)) = get("SERVICE_URL") {
            config.service_url = url.trim_end_matches('/').to_string();
        }
        if let Some((key, v)) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_value(&key, &v)?);
        }
        if let Some((key, v)) = get("CHECK_TIMEOUT_SECS") {
            config.check_timeout = Duration::from_secs(parse_value(&key, &v)?);
        }
        if let Some((key, v)) = get("BIND_ADDR") {
            config.bind_addr = parse_value(&key, &v)?;
        }
        if let Some((key, v)) = get("ASSISTANT") {
            config.assistant_mode = parse_value(&key, &v)?;
        }
        if let Some((key, v)) = get("SIMULATED_REPLY_MS") {
            config.simulated_reply_delay = Duration::from_millis(parse_value(&key, &v)?);
        }
        if let Some((key, v)) = get("MATCH_STRATEGY") {
            config.match_strategy = parse_value(&key, &v)?;
        }

        Ok(config)
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        detail: e.to_string(),
    })
}
