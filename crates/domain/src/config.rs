//! Configuration structures
//!
//! Every section has a `Default` so partial JSON/TOML files are accepted;
//! missing keys fall back to the values in [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLIENT_BASE_URL, DEFAULT_CLIENT_TIMEOUT_MS, DEFAULT_CONCURRENCY_LIMIT,
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MULTIPLIER,
};
use crate::impl_config_enum_conversions;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resilience: ResilienceConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

/// How callers are admitted when the concurrency limit is saturated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionMode {
    /// Wait for a slot (optionally bounded by `acquire_timeout_ms`)
    #[default]
    Wait,
    /// Fail immediately without invoking the operation
    Reject,
}

impl_config_enum_conversions!(AdmissionMode {
    Wait => "wait",
    Reject => "reject",
});

/// Randomisation applied on top of the computed backoff delay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    #[default]
    None,
    /// Uniform in `[0, delay]`
    Full,
    /// Uniform in `[delay / 2, delay]`
    Equal,
}

impl_config_enum_conversions!(JitterMode {
    None => "none",
    Full => "full",
    Equal => "equal",
});

/// Retry and admission settings for a guarded operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Total attempts including the first one (>= 1)
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    /// Backoff growth factor (>= 1.0)
    pub multiplier: f64,
    pub max_delay_ms: Option<u64>,
    pub jitter: JitterMode,
    /// Maximum in-flight executions (>= 1)
    pub concurrency_limit: usize,
    pub admission: AdmissionMode,
    /// Only consulted in `wait` mode; `None` waits indefinitely
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay_ms: None,
            jitter: JitterMode::None,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            admission: AdmissionMode::Wait,
            acquire_timeout_ms: None,
        }
    }
}

/// Which `ApiClient` implementation the binary wires in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientBackend {
    /// In-process client answering `Body for key: {key}`
    #[default]
    Echo,
    /// HTTP requests against `base_url`
    Http,
}

impl_config_enum_conversions!(ClientBackend {
    Echo => "echo",
    Http => "http",
});

/// Outbound API client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: ClientBackend,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: ClientBackend::Echo,
            base_url: DEFAULT_CLIENT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_CLIENT_TIMEOUT_MS,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
