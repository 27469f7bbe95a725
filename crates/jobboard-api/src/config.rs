//! API configuration.

use std::time::Duration;

/// Secret used when `JWT_SECRET` is unset. Rejected in production.
const DEV_JWT_SECRET: &str = "jobboard-development-secret";

/// Which entity store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process memory, lost on restart.
    Memory,
    /// Google Firestore over REST.
    Firestore,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Some(Self::Memory),
            "firestore" => Some(Self::Firestore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Firestore => "firestore",
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` allows any origin without credentials
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret shared with the session issuer
    pub jwt_secret: String,
    pub store_backend: StoreBackend,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
            environment: "development".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            store_backend: StoreBackend::Memory,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            request_timeout: std::env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.jwt_secret),
            store_backend: std::env::var("STORE_BACKEND")
                .ok()
                .and_then(|s| StoreBackend::parse(&s))
                .unwrap_or(defaults.store_backend),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Reject settings that are unsafe for the current environment.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.jwt_secret == DEV_JWT_SECRET {
            return Err("JWT_SECRET must be set in production".to_string());
        }
        if self.is_production() && self.store_backend == StoreBackend::Memory {
            return Err("STORE_BACKEND=memory is not allowed in production".to_string());
        }
        Ok(())
    }
}
