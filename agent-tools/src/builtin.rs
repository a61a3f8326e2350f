//! Service-backed tools: `fetch` (file contents) and `playwright` (scripts).

use std::sync::Arc;

use agent_adapters::services::{ScriptPermit, ServiceClient};
use agent_primitives::{CapabilityGrant, CapabilityId};
use async_trait::async_trait;

use crate::registry::{Tool, ToolMetadata, ToolRegistry, ToolResult};

/// Name under which [`FetchTool`] is registered.
pub const FETCH_TOOL: &str = "fetch";

/// Name under which [`PlaywrightTool`] is registered.
pub const PLAYWRIGHT_TOOL: &str = "playwright";

/// Reads a file through the fetch service; the tool input is the path.
#[derive(Debug, Clone)]
pub struct FetchTool {
    client: Arc<ServiceClient>,
}

impl FetchTool {
    /// Wraps a shared service client.
    #[must_use]
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }

    /// Descriptor advertised to the reasoning strategy.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the name is a valid constant.
    pub fn metadata() -> ToolResult<ToolMetadata> {
        Ok(ToolMetadata::new(FETCH_TOOL)?
            .with_description("Fetch the content of a local file given its path")
            .with_capabilities(vec![CapabilityId::file_read()]))
    }
}

#[async_trait]
impl Tool for FetchTool {
    async fn invoke(&self, input: &str) -> ToolResult<String> {
        Ok(self.client.fetch(input).await?)
    }
}

/// Runs a Playwright script on the automation service; the input is the script.
#[derive(Debug, Clone)]
pub struct PlaywrightTool {
    client: Arc<ServiceClient>,
    permit: ScriptPermit,
}

impl PlaywrightTool {
    /// Wraps a shared service client together with the permit it needs.
    #[must_use]
    pub fn new(client: Arc<ServiceClient>, permit: ScriptPermit) -> Self {
        Self { client, permit }
    }

    /// Descriptor advertised to the reasoning strategy.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the name is a valid constant.
    pub fn metadata() -> ToolResult<ToolMetadata> {
        Ok(ToolMetadata::new(PLAYWRIGHT_TOOL)?
            .with_description("Run a Playwright script and return its output")
            .with_capabilities(vec![CapabilityId::script_execute()]))
    }
}

#[async_trait]
impl Tool for PlaywrightTool {
    async fn invoke(&self, input: &str) -> ToolResult<String> {
        Ok(self.client.run_script(&self.permit, input).await?)
    }
}

/// Registers `fetch` and, when `grant` allows script execution, `playwright`.
///
/// Returns the names registered, in order.
///
/// # Errors
///
/// Returns [`crate::registry::ToolError::DuplicateTool`] if either name is
/// already taken.
pub fn register_service_tools(
    registry: &ToolRegistry,
    client: &Arc<ServiceClient>,
    grant: &CapabilityGrant,
) -> ToolResult<Vec<&'static str>> {
    let mut registered = Vec::with_capacity(2);

    registry.register_tool(FetchTool::metadata()?, FetchTool::new(Arc::clone(client)))?;
    registered.push(FETCH_TOOL);

    match ScriptPermit::from_grant(grant) {
        Ok(permit) => {
            registry.register_tool(
                PlaywrightTool::metadata()?,
                PlaywrightTool::new(Arc::clone(client), permit),
            )?;
            registered.push(PLAYWRIGHT_TOOL);
        }
        Err(err) => {
            tracing::info!(tool = PLAYWRIGHT_TOOL, %err, "tool not registered");
        }
    }

    Ok(registered)
}
