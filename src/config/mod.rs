use std::env;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the host service.
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

/// Default Gemini generateContent endpoint used when none is configured.
pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const DEFAULT_SUMMARY_TIMEOUT_MS: u64 = 10_000;

/// Top-level configuration for the engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub summary: SummaryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let endpoint =
            env::var("GEMINI_ENDPOINT").unwrap_or_else(|_| DEFAULT_GEMINI_ENDPOINT.to_string());
        let timeout_ms = match env::var("SUMMARY_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?,
            Err(_) => DEFAULT_SUMMARY_TIMEOUT_MS,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            summary: SummaryConfig {
                api_key,
                endpoint,
                request_timeout: Duration::from_millis(timeout_ms),
            },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Settings for the external text-generation collaborator.
///
/// A missing API key is valid configuration: summarization then degrades to
/// its fixed fallback string instead of failing the calculation path.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SUMMARY_TIMEOUT_MS must be a positive integer of milliseconds, got '{value}'")]
    InvalidTimeout { value: String },
}
