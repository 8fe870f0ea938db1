//! Configuration loading and validation for Tripsmith.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run budget and concurrency settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Retry policy for transient gateway failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Completion provider settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Budget and concurrency settings for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum model invocations per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Deadline for a single tool execution, in seconds.
    #[serde(default = "default_per_tool_timeout_secs")]
    pub per_tool_timeout_secs: u64,

    /// Deadline for a single model invocation, in seconds.
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Upper bound on tool calls executing at once within one turn.
    #[serde(default = "default_max_concurrent_tool_calls")]
    pub max_concurrent_tool_calls: usize,
}

impl RunConfig {
    pub fn per_tool_timeout(&self) -> Duration {
        Duration::from_secs(self.per_tool_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

/// Bounded exponential backoff for transient gateway failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per model invocation (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// The backoff delay before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(exp.min(self.max_delay_ms))
    }
}

/// Completion provider settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of an OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Usually supplied via `TRIPSMITH_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per model response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_per_tool_timeout_secs() -> u64 {
    30
}
fn default_model_timeout_secs() -> u64 {
    120
}
fn default_max_concurrent_tool_calls() -> usize {
    4
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("run", &self.run)
            .field("retry", &self.retry)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a file path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `TRIPSMITH_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if self.gateway.api_key.is_none() {
            self.gateway.api_key = std::env::var("TRIPSMITH_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(base_url) = std::env::var("TRIPSMITH_BASE_URL") {
            self.gateway.base_url = base_url;
        }

        if let Ok(model) = std::env::var("TRIPSMITH_MODEL") {
            self.gateway.model = model;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "run.max_iterations must be at least 1".into(),
            ));
        }

        if self.run.max_concurrent_tool_calls == 0 {
            return Err(ConfigError::ValidationError(
                "run.max_concurrent_tool_calls must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.gateway.temperature < 0.0 || self.gateway.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "gateway.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            retry: RetryConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            per_tool_timeout_secs: default_per_tool_timeout_secs(),
            model_timeout_secs: default_model_timeout_secs(),
            max_concurrent_tool_calls: default_max_concurrent_tool_calls(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.max_iterations, 10);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.run.max_iterations, config.run.max_iterations);
        assert_eq!(back.gateway.model, config.gateway.model);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[run]\nmax_iterations = 3\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.run.max_iterations, 3);
        assert_eq!(
            config.run.per_tool_timeout_secs,
            default_per_tool_timeout_secs()
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.run.max_iterations, 10);
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = AppConfig {
            run: RunConfig {
                max_iterations: 0,
                ..RunConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let config = GatewayConfig {
            api_key: Some("sk-secret".into()),
            ..GatewayConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn backoff_is_bounded() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(1_000));
        // Past the ceiling the delay stops growing.
        assert_eq!(retry.delay_for_attempt(10), Duration::from_millis(8_000));
    }
}
