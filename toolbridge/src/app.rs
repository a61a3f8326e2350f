//! Builds a ready-to-run [`AgentDriver`] from configuration.

use std::sync::Arc;
use std::time::Duration;

use agent_adapters::openai::{OpenAiAdapter, OpenAiConfig};
use agent_adapters::services::{ServiceClient, ServiceConfig};
use agent_adapters::traits::{AdapterError, ModelAdapter};
use agent_config::AgentConfig;
use agent_kernel::{AgentDriver, ReactConfig, ReactStrategy};
use agent_tools::builtin::register_service_tools;
use agent_tools::registry::{ToolError, ToolRegistry};
use thiserror::Error;
use tracing::info;

/// Task run when none is given on the command line.
pub const DEFAULT_TASK: &str = "1. Use the fetch tool to read '/data/example.txt'. \
2. Based on its contents, write and run a Playwright script that navigates to example.com, \
grabs the first <h1> text, and returns it. \
Please show both the fetched file content and the scraped heading.";

/// Banner printed above the final answer.
pub const OUTPUT_BANNER: &str = "\n===== Agent Output =====\n";

/// Errors raised while assembling the agent.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A model or service adapter could not be constructed.
    #[error("adapter setup failed")]
    Adapter(#[from] AdapterError),
    /// Tool registration failed.
    #[error("tool setup failed")]
    Tool(#[from] ToolError),
}

/// Builds the chat-completions adapter described by `config.model`.
///
/// The API key falls back to `OPENAI_API_KEY` when the configuration has none.
///
/// # Errors
///
/// Returns [`SetupError::Adapter`] if the base URL is invalid.
pub fn model_adapter(config: &AgentConfig) -> Result<OpenAiAdapter, SetupError> {
    let model = &config.model;
    let mut openai = OpenAiConfig::from_env(model.model.clone())
        .with_base_url(&model.base_url)?
        .with_timeout(Duration::from_secs(model.timeout_secs));
    if let Some(key) = &model.api_key {
        openai = openai.with_api_key(key.clone());
    }
    Ok(OpenAiAdapter::new(openai)?)
}

/// Wires services, tools, strategy, and grant into a driver using `adapter`
/// for reasoning.
///
/// # Errors
///
/// Returns [`SetupError`] if a service endpoint is invalid or tool
/// registration fails.
pub fn assemble(
    config: &AgentConfig,
    adapter: Arc<dyn ModelAdapter>,
) -> Result<AgentDriver, SetupError> {
    let mut services = ServiceConfig::new(&config.services.fetch_url, &config.services.script_url)?;
    if let Some(secs) = config.services.timeout_secs {
        services = services.with_timeout(Duration::from_secs(secs));
    }
    let client = Arc::new(ServiceClient::new(&services)?);

    let grant = config.capability_grant();
    let registry = ToolRegistry::new();
    let registered = register_service_tools(&registry, &client, &grant)?;
    info!(
        tools = ?registered,
        fetch = %config.services.fetch_url,
        script = %config.services.script_url,
        "tools registered"
    );

    let react = ReactConfig {
        max_iterations: config.agent.max_iterations,
        temperature: config.model.temperature,
        max_output_tokens: config.model.max_output_tokens,
        verbose: config.agent.verbose,
    };
    let strategy = ReactStrategy::with_config(adapter, react);

    Ok(AgentDriver::new(Arc::new(strategy), Arc::new(registry)).with_grant(grant))
}
