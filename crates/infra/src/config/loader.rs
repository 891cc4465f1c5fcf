//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Probes multiple paths for a config file (JSON or TOML)
//! 2. Falls back to built-in defaults when no file exists
//! 3. Applies `BOOTNOTES_*` environment variables on top
//!
//! Every field has a default, so both files and the environment may be
//! partial.
//!
//! ## Environment Variables
//! - `BOOTNOTES_MAX_ATTEMPTS`: Total attempts including the first one
//! - `BOOTNOTES_INITIAL_DELAY_MS`: Delay before the first retry
//! - `BOOTNOTES_MULTIPLIER`: Backoff growth factor
//! - `BOOTNOTES_MAX_DELAY_MS`: Upper bound on a single delay
//! - `BOOTNOTES_JITTER`: `none`, `full` or `equal`
//! - `BOOTNOTES_CONCURRENCY_LIMIT`: Maximum in-flight executions
//! - `BOOTNOTES_ADMISSION_MODE`: `wait` or `reject`
//! - `BOOTNOTES_ACQUIRE_TIMEOUT_MS`: Admission wait bound in `wait` mode
//! - `BOOTNOTES_CLIENT_BACKEND`: `echo` or `http`
//! - `BOOTNOTES_CLIENT_BASE_URL`: Upstream API base URL
//! - `BOOTNOTES_CLIENT_TIMEOUT_MS`: Per-request client timeout
//! - `BOOTNOTES_LOG_LEVEL`: Log filter directive
//! - `BOOTNOTES_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./bootnotes.json` or `./bootnotes.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bootnotes_domain::constants::ENV_PREFIX;
use bootnotes_domain::{BootNotesError, Config, Result};

/// Load configuration with the layered strategy described above
///
/// # Errors
/// Returns `BootNotesError::Config` if a probed file cannot be read or
/// parsed, or an environment variable has an invalid value.
pub fn load() -> Result<Config> {
    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from defaults and environment variables only
///
/// # Errors
/// Returns `BootNotesError::Config` if a variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Overwrite fields of `config` with every `BOOTNOTES_*` variable that is set
///
/// # Errors
/// Returns `BootNotesError::Config` naming the variable whose value could
/// not be parsed.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    let mut applied = 0usize;
    let mut track = |set: bool| applied += usize::from(set);

    let resilience = &mut config.resilience;
    track(override_with(&mut resilience.max_attempts, "MAX_ATTEMPTS")?);
    track(override_with(&mut resilience.initial_delay_ms, "INITIAL_DELAY_MS")?);
    track(override_with(&mut resilience.multiplier, "MULTIPLIER")?);
    track(override_optional(&mut resilience.max_delay_ms, "MAX_DELAY_MS")?);
    track(override_with(&mut resilience.jitter, "JITTER")?);
    track(override_with(&mut resilience.concurrency_limit, "CONCURRENCY_LIMIT")?);
    track(override_with(&mut resilience.admission, "ADMISSION_MODE")?);
    track(override_optional(&mut resilience.acquire_timeout_ms, "ACQUIRE_TIMEOUT_MS")?);

    track(override_with(&mut config.client.backend, "CLIENT_BACKEND")?);
    track(override_with(&mut config.client.base_url, "CLIENT_BASE_URL")?);
    track(override_with(&mut config.client.timeout_ms, "CLIENT_TIMEOUT_MS")?);

    track(override_with(&mut config.logging.level, "LOG_LEVEL")?);
    if let Some(json) = env_bool(&env_key("LOG_JSON")) {
        config.logging.json = json;
        track(true);
    }

    if applied > 0 {
        tracing::info!(variables = applied, "Applied configuration from environment variables");
    }
    Ok(())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BootNotesError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BootNotesError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BootNotesError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BootNotesError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BootNotesError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BootNotesError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BootNotesError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "bootnotes.json", "bootnotes.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Replace `target` with the parsed value of `BOOTNOTES_{suffix}` if set
fn override_with<T>(target: &mut T, suffix: &str) -> Result<bool>
where
    T: FromStr,
    T::Err: Display,
{
    match env_parse(&env_key(suffix))? {
        Some(value) => {
            *target = value;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn override_optional<T>(target: &mut Option<T>, suffix: &str) -> Result<bool>
where
    T: FromStr,
    T::Err: Display,
{
    match env_parse(&env_key(suffix))? {
        Some(value) => {
            *target = Some(value);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `BootNotesError::Config` if the variable is set but invalid.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| BootNotesError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
/// Returns `None` when the variable is not set.
fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
