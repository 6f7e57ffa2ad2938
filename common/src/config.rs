//! Environment-driven configuration.
//!
//! Services read `SERVER_HOST` / `SERVER_PORT`; the client reads the
//! `PGM_*` variables. A `.env` file in the working directory is honoured by
//! [`load_dotenv`] without overriding variables already set.

use std::path::PathBuf;
use std::time::Duration;

use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Default backend address used by the client.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name used in logs and health responses.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl AppConfig {
    /// Loads the service configuration from the environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Validate)]
pub struct ClientConfig {
    /// Backend base URL, without the `/api/v1` prefix.
    #[validate(url(message = "base URL must be an absolute http(s) URL"))]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[validate(range(min = 1, max = 3_600_000, message = "timeout must be 1..=3600000 ms"))]
    pub timeout_ms: u64,

    /// Directory dumps are saved into.
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            download_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Loads the client configuration from the environment and validates it.
    pub fn load() -> AppResult<Self> {
        let defaults = Self::default();
        let timeout_ms = match std::env::var("PGM_API_TIMEOUT_MS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                AppError::Config(format!("PGM_API_TIMEOUT_MS is not a number: {}", raw))
            })?,
            Err(_) => defaults.timeout_ms,
        };

        let config = Self {
            base_url: std::env::var("PGM_API_BASE_URL").unwrap_or(defaults.base_url),
            timeout_ms,
            download_dir: std::env::var("PGM_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
        };
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides and re-validates.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        timeout_ms: Option<u64>,
        download_dir: Option<PathBuf>,
    ) -> AppResult<Self> {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(ms) = timeout_ms {
            self.timeout_ms = ms;
        }
        if let Some(dir) = download_dir {
            self.download_dir = dir;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Loads a `.env` file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if !env_path.exists() {
        return;
    }
    if let Ok(content) = std::fs::read_to_string(env_path) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');
                // Only set if not already set by the environment
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}
