//! Strongly typed configuration schema.

use agent_primitives::{CapabilityGrant, CapabilityId};
use serde::{Deserialize, Serialize};

use crate::loader::{ConfigError, ConfigResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Tool service endpoints.
    pub services: ServicesConfig,
    /// Chat-completions model settings.
    pub model: ModelConfig,
    /// Reasoning loop settings.
    pub agent: AgentSettings,
}

/// Endpoints of the file-fetch and script-execution services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServicesConfig {
    /// URL receiving `{"path": ...}` posts.
    pub fetch_url: String,
    /// URL receiving `{"script": ...}` posts.
    pub script_url: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            fetch_url: "http://localhost:7001/fetch".to_owned(),
            script_url: "http://localhost:7002/run".to_owned(),
            timeout_secs: None,
        }
    }
}

/// OpenAI-compatible model server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Base URL; `chat/completions` is appended.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token. Local servers ignore it.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Output token budget per step.
    pub max_output_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_owned(),
            model: "phi-3.5-mini".to_owned(),
            api_key: None,
            temperature: Some(0.7),
            max_output_tokens: Some(256),
            timeout_secs: 60,
        }
    }
}

/// Reasoning loop settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSettings {
    /// Model calls allowed before the run is stopped.
    pub max_iterations: usize,
    /// Whether the `playwright` tool may forward scripts for execution.
    pub allow_script_execution: bool,
    /// Log every thought, action, and observation at `info`.
    pub verbose: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            allow_script_execution: true,
            verbose: false,
        }
    }
}

impl AgentConfig {
    /// Checks values that would otherwise fail later, at construction time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> ConfigResult<()> {
        require_http_url("services.fetch_url", &self.services.fetch_url)?;
        require_http_url("services.script_url", &self.services.script_url)?;
        require_http_url("model.base_url", &self.model.base_url)?;

        if self.model.model.trim().is_empty() {
            return Err(ConfigError::invalid("model.model", "cannot be empty"));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::invalid("model.timeout_secs", "must be positive"));
        }
        if self.services.timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "services.timeout_secs",
                "must be positive when set",
            ));
        }
        if let Some(temperature) = self.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::invalid(
                    "model.temperature",
                    "must be between 0.0 and 2.0",
                ));
            }
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::invalid("agent.max_iterations", "must be positive"));
        }
        Ok(())
    }

    /// Capabilities the driver is granted under this configuration.
    #[must_use]
    pub fn capability_grant(&self) -> CapabilityGrant {
        let grant = CapabilityGrant::of([CapabilityId::file_read(), CapabilityId::script_execute()]);
        if self.agent.allow_script_execution {
            grant
        } else {
            grant.without(&CapabilityId::script_execute())
        }
    }
}

fn require_http_url(key: &'static str, value: &str) -> ConfigResult<()> {
    let value = value.trim();
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::invalid(
            key,
            format!("`{value}` is not an http:// or https:// URL"),
        )),
    }
}
