//! Configuration loader: JSON file plus environment overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::schema::AgentConfig;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "TOOLBRIDGE_";

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for the schema.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range or malformed.
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue {
        /// Dotted key or environment variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Loads configuration from `path` (or defaults), applies process
/// environment overrides, and validates the result.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, an override
/// cannot be parsed, or validation fails.
pub fn load(path: Option<&Path>) -> ConfigResult<AgentConfig> {
    let mut config = match path {
        Some(path) => from_file(path)?,
        None => AgentConfig::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Reads a JSON configuration file. Missing sections take their defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
pub fn from_file(path: &Path) -> ConfigResult<AgentConfig> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })?;
    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Applies `TOOLBRIDGE_*` overrides obtained through `lookup`.
///
/// Recognised suffixes: `FETCH_URL`, `SCRIPT_URL`, `SERVICE_TIMEOUT_SECS`,
/// `MODEL_URL`, `MODEL`, `API_KEY`, `MAX_ITERATIONS`, `ALLOW_SCRIPTS`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when a numeric or boolean override
/// does not parse.
pub fn apply_env<F>(config: &mut AgentConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        let key = format!("{ENV_PREFIX}{suffix}");
        lookup(&key).map(|value| (key, value))
    };

    if let Some((_, value)) = var("FETCH_URL") {
        config.services.fetch_url = value;
    }
    if let Some((_, value)) = var("SCRIPT_URL") {
        config.services.script_url = value;
    }
    if let Some((key, value)) = var("SERVICE_TIMEOUT_SECS") {
        config.services.timeout_secs = Some(parse(&key, &value)?);
    }
    if let Some((_, value)) = var("MODEL_URL") {
        config.model.base_url = value;
    }
    if let Some((_, value)) = var("MODEL") {
        config.model.model = value;
    }
    if let Some((_, value)) = var("API_KEY") {
        config.model.api_key = Some(value);
    }
    if let Some((key, value)) = var("MAX_ITERATIONS") {
        config.agent.max_iterations = parse(&key, &value)?;
    }
    if let Some((key, value)) = var("ALLOW_SCRIPTS") {
        config.agent.allow_script_execution = parse_flag(&key, &value)?;
    }
    Ok(())
}

fn parse<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| ConfigError::invalid(key, format!("`{value}`: {err}")))
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(
            key,
            format!("`{other}` is not a boolean"),
        )),
    }
}
