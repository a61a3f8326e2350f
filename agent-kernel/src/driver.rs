//! Agent driver: one task in, one answer out.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use agent_primitives::{CapabilityGrant, CapabilityId};
use agent_tools::registry::ToolRegistry;
use tracing::{info, warn};

use crate::error::{KernelError, KernelResult};
use crate::strategy::{AgentStrategy, Toolbox};

/// Runs tasks against a fixed tool list with an injected strategy.
#[derive(Clone)]
pub struct AgentDriver {
    strategy: Arc<dyn AgentStrategy>,
    tools: Arc<ToolRegistry>,
    grant: CapabilityGrant,
}

impl fmt::Debug for AgentDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDriver")
            .field("strategy", &self.strategy.name())
            .field("tools", &self.tools)
            .field("grant", &self.grant)
            .finish()
    }
}

impl AgentDriver {
    /// Creates a driver with an empty capability grant.
    ///
    /// Tools that declare capabilities are refused until
    /// [`AgentDriver::with_grant`] allows them.
    #[must_use]
    pub fn new(strategy: Arc<dyn AgentStrategy>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            strategy,
            tools,
            grant: CapabilityGrant::none(),
        }
    }

    /// Replaces the capability grant, returning the updated driver.
    #[must_use]
    pub fn with_grant(mut self, grant: CapabilityGrant) -> Self {
        self.grant = grant;
        self
    }

    /// Returns the capability grant.
    #[must_use]
    pub fn grant(&self) -> &CapabilityGrant {
        &self.grant
    }

    /// Returns the tool registry.
    #[must_use]
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Runs `task` to completion and returns the strategy's final answer.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::EmptyTask`] for blank input; otherwise whatever
    /// the strategy fails with. Tool failures are not caught.
    pub async fn run(&self, task: &str) -> KernelResult<String> {
        let task = task.trim();
        if task.is_empty() {
            return Err(KernelError::EmptyTask);
        }

        if self.tools.is_empty() {
            warn!("agent run started with no tools registered");
        }

        let toolbox = Toolbox::new(Arc::clone(&self.tools), self.grant.clone());
        let tool_names: Vec<String> = toolbox
            .descriptors()
            .into_iter()
            .map(|meta| meta.name().to_owned())
            .collect();
        let granted: Vec<&str> = self.grant.iter().map(CapabilityId::as_str).collect();
        info!(
            strategy = self.strategy.name(),
            tools = ?tool_names,
            granted = ?granted,
            "agent run started"
        );

        let started = Instant::now();
        let outcome = self.strategy.run(task, &toolbox).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &outcome {
            Ok(answer) => info!(
                tool_calls = toolbox.calls(),
                elapsed_ms,
                answer_len = answer.len(),
                "agent run finished"
            ),
            Err(err) => warn!(
                tool_calls = toolbox.calls(),
                elapsed_ms,
                error = %err,
                "agent run failed"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use agent_tools::registry::{ToolError, ToolMetadata};
    use async_trait::async_trait;

    /// Calls each listed tool once with a fixed input, then joins the results.
    struct SequenceStrategy {
        calls: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl AgentStrategy for SequenceStrategy {
        fn name(&self) -> &str {
            "sequence"
        }

        async fn run(&self, task: &str, toolbox: &Toolbox) -> KernelResult<String> {
            let mut parts = vec![task.to_owned()];
            for (tool, input) in &self.calls {
                parts.push(toolbox.call(tool, input).await?);
            }
            Ok(parts.join(" | "))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        registry
            .register_tool(
                ToolMetadata::new("fetch")
                    .unwrap()
                    .with_capabilities(vec![CapabilityId::file_read()]),
                |path: String| async move { Ok(format!("content of {path}")) },
            )
            .unwrap();
        registry
            .register_tool(
                ToolMetadata::new("playwright")
                    .unwrap()
                    .with_capabilities(vec![CapabilityId::script_execute()]),
                |_script: String| async move { Err(ToolError::execution("browser crashed")) },
            )
            .unwrap();
        Arc::new(registry)
    }

    fn driver(calls: Vec<(&'static str, &'static str)>) -> AgentDriver {
        AgentDriver::new(Arc::new(SequenceStrategy { calls }), registry()).with_grant(
            CapabilityGrant::of([CapabilityId::file_read(), CapabilityId::script_execute()]),
        )
    }

    #[tokio::test]
    async fn returns_strategy_answer() {
        let answer = driver(vec![("fetch", "/data/example.txt")])
            .run("  summarise  ")
            .await
            .unwrap();
        assert_eq!(answer, "summarise | content of /data/example.txt");
    }

    #[tokio::test]
    async fn runs_with_empty_registry() {
        let driver = AgentDriver::new(
            Arc::new(SequenceStrategy { calls: Vec::new() }),
            Arc::new(ToolRegistry::new()),
        );
        assert!(driver.tools().is_empty());
        assert_eq!(driver.run("just answer").await.unwrap(), "just answer");
    }

    #[tokio::test]
    async fn rejects_blank_task() {
        let err = driver(Vec::new()).run(" \n").await.expect_err("blank");
        assert!(matches!(err, KernelError::EmptyTask));
    }

    #[tokio::test]
    async fn tool_failure_terminates_run() {
        let err = driver(vec![("fetch", "/a"), ("playwright", "goto")])
            .run("task")
            .await
            .expect_err("tool fails");
        assert!(matches!(err, KernelError::Tool { ref name, .. } if name == "playwright"));
    }

    #[tokio::test]
    async fn default_grant_refuses_capability_tools() {
        let driver = AgentDriver::new(
            Arc::new(SequenceStrategy {
                calls: vec![("fetch", "/a")],
            }),
            registry(),
        );
        assert!(driver.grant().is_empty());

        let err = driver.run("task").await.expect_err("no grant");
        assert!(matches!(err, KernelError::CapabilityDenied { ref capability, .. } if capability == "fs.read"));
    }
}
