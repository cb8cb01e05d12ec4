use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::decisioning::{HeuristicPolicy, DEFAULT_APPROVAL_CUTOFF, DEFAULT_SCHEMA_REVISION};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub decisioning: DecisioningConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            decisioning: DecisioningConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the model artifact and feature schema live, and how the fallback behaves.
#[derive(Debug, Clone)]
pub struct DecisioningConfig {
    pub model_path: PathBuf,
    /// Schema file; when unset the built-in `schema_revision` is used.
    pub schema_path: Option<PathBuf>,
    pub schema_revision: String,
    pub heuristic_cutoff: f64,
}

impl DecisioningConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let model_path = env::var("CREDIT_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models/loan_model.json"));

        let schema_path = env::var("CREDIT_SCHEMA_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let schema_revision = env::var("CREDIT_SCHEMA_REVISION")
            .unwrap_or_else(|_| DEFAULT_SCHEMA_REVISION.to_string());

        let heuristic_cutoff = match env::var("CREDIT_HEURISTIC_CUTOFF") {
            Ok(raw) => parse_cutoff(&raw)?,
            Err(_) => DEFAULT_APPROVAL_CUTOFF,
        };

        Ok(Self {
            model_path,
            schema_path,
            schema_revision,
            heuristic_cutoff,
        })
    }

    pub fn heuristic_policy(&self) -> HeuristicPolicy {
        HeuristicPolicy::new(self.heuristic_cutoff)
    }
}

impl Default for DecisioningConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/loan_model.json"),
            schema_path: None,
            schema_revision: DEFAULT_SCHEMA_REVISION.to_string(),
            heuristic_cutoff: DEFAULT_APPROVAL_CUTOFF,
        }
    }
}

fn parse_cutoff(raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidCutoff(raw.to_string()))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidCutoff(raw.to_string()))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCutoff(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCutoff(value) => write!(
                f,
                "CREDIT_HEURISTIC_CUTOFF must be a positive number (found '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidCutoff(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
