//! Strategy seam between the driver and the reasoning loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use agent_primitives::CapabilityGrant;
use agent_tools::registry::{ToolMetadata, ToolRegistry};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{KernelError, KernelResult};

/// A reasoning strategy: given a task and a toolbox, produce a final answer.
///
/// Implementations may call tools through the [`Toolbox`] any number of
/// times, one at a time, in whatever order they choose.
#[async_trait]
pub trait AgentStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Runs `task` to completion.
    async fn run(&self, task: &str, toolbox: &Toolbox) -> KernelResult<String>;
}

/// The tools a strategy may call during one run.
///
/// Every call is checked against the capability grant before it reaches the
/// tool implementation.
pub struct Toolbox {
    registry: Arc<ToolRegistry>,
    grant: CapabilityGrant,
    calls: AtomicUsize,
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("registry", &self.registry)
            .field("grant", &self.grant)
            .field("calls", &self.calls())
            .finish()
    }
}

impl Toolbox {
    /// Creates a toolbox over `registry` limited by `grant`.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, grant: CapabilityGrant) -> Self {
        Self {
            registry,
            grant,
            calls: AtomicUsize::new(0),
        }
    }

    /// Tool descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolMetadata> {
        self.registry.list()
    }

    /// Returns `true` if a tool with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.get(name).is_some()
    }

    /// Number of tool invocations that reached a tool implementation.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Invokes tool `name` with `input`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownTool`] for an unregistered name,
    /// [`KernelError::CapabilityDenied`] when the grant lacks a capability the
    /// tool declares, and [`KernelError::Tool`] when the tool itself fails.
    pub async fn call(&self, name: &str, input: &str) -> KernelResult<String> {
        let handle = self
            .registry
            .get(name)
            .ok_or_else(|| KernelError::UnknownTool {
                name: name.to_owned(),
            })?;

        if let Some(missing) = self.grant.first_missing(handle.metadata().capabilities()) {
            warn!(tool = name, capability = %missing, "tool call refused");
            return Err(KernelError::CapabilityDenied {
                tool: name.to_owned(),
                capability: missing.to_string(),
            });
        }

        self.calls.fetch_add(1, Ordering::Relaxed);
        debug!(tool = name, input_len = input.len(), "invoking tool");

        let output = handle
            .invoke(input)
            .await
            .map_err(|source| KernelError::Tool {
                name: name.to_owned(),
                source,
            })?;

        debug!(tool = name, output_len = output.len(), "tool returned");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use agent_primitives::CapabilityId;
    use agent_tools::registry::ToolError;

    fn registry() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        registry
            .register_tool(
                ToolMetadata::new("read")
                    .unwrap()
                    .with_capabilities(vec![CapabilityId::file_read()]),
                |input: String| async move { Ok(format!("read:{input}")) },
            )
            .unwrap();
        registry
            .register_tool(
                ToolMetadata::new("exec")
                    .unwrap()
                    .with_capabilities(vec![CapabilityId::script_execute()]),
                |_input: String| async move { Ok("executed".to_owned()) },
            )
            .unwrap();
        registry
            .register_tool(ToolMetadata::new("broken").unwrap(), |_input: String| async move {
                Err(ToolError::execution("boom"))
            })
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn granted_tool_runs_and_is_counted() {
        let toolbox = Toolbox::new(
            registry(),
            CapabilityGrant::none().with(CapabilityId::file_read()),
        );

        assert_eq!(toolbox.call("read", "/a").await.unwrap(), "read:/a");
        assert_eq!(toolbox.calls(), 1);
        assert!(toolbox.contains("exec"));
        assert_eq!(toolbox.descriptors().len(), 3);
    }

    #[tokio::test]
    async fn ungranted_tool_is_refused_before_running() {
        let toolbox = Toolbox::new(
            registry(),
            CapabilityGrant::none().with(CapabilityId::file_read()),
        );

        let err = toolbox.call("exec", "rm -rf /").await.expect_err("refused");
        assert!(matches!(
            err,
            KernelError::CapabilityDenied { ref tool, ref capability }
                if tool == "exec" && capability == "script.execute"
        ));
        assert_eq!(toolbox.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_and_failing_tools_error() {
        let toolbox = Toolbox::new(registry(), CapabilityGrant::none());

        let err = toolbox.call("nope", "").await.expect_err("unknown");
        assert!(matches!(err, KernelError::UnknownTool { name } if name == "nope"));

        let err = toolbox.call("broken", "").await.expect_err("fails");
        assert!(matches!(err, KernelError::Tool { ref name, .. } if name == "broken"));
        assert_eq!(err.to_string(), "tool `broken` failed");
        let cause = std::error::Error::source(&err).expect("tool error kept as source");
        assert!(cause.to_string().contains("boom"));
    }
}
