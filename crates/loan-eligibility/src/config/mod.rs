use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use reqwest::Url;

use crate::workflows::eligibility::ResponseOrdering;

pub const DEFAULT_PREDICTION_ENDPOINT: &str = "http://127.0.0.1:5000/predict";

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
    pub prediction: PredictionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let endpoint = parse_endpoint(
            &env::var("PREDICTION_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_PREDICTION_ENDPOINT.to_string()),
        )?;
        let ordering = match env::var("PREDICTION_RESPONSE_ORDERING") {
            Ok(raw) => raw
                .parse::<ResponseOrdering>()
                .map_err(|reason| ConfigError::InvalidOrdering { reason })?,
            Err(_) => ResponseOrdering::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prediction: PredictionConfig { endpoint, ordering },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where eligibility payloads are posted and how overlapping replies are reconciled.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub endpoint: Url,
    pub ordering: ResponseOrdering,
}

/// Accepts absolute http(s) URLs only.
pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEndpoint { value: String, reason: String },
    InvalidOrdering { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEndpoint { value, reason } => write!(
                f,
                "PREDICTION_ENDPOINT '{value}' must be an absolute http(s) URL ({reason})"
            ),
            ConfigError::InvalidOrdering { reason } => {
                write!(f, "PREDICTION_RESPONSE_ORDERING is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidEndpoint { .. }
            | ConfigError::InvalidOrdering { .. } => None,
        }
    }
}
