//! Runtime registry for tool descriptors and execution.

use std::future::Future;
use std::sync::{Arc, RwLock};

use agent_adapters::traits::AdapterError;
use agent_primitives::CapabilityId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Metadata describing a registered tool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    capabilities: Vec<CapabilityId>,
}

impl ToolMetadata {
    /// Creates metadata for the supplied tool name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if the name is blank or contains
    /// whitespace (the name is matched verbatim against model output).
    pub fn new(name: impl Into<String>) -> ToolResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::InvalidMetadata {
                reason: "tool name cannot be empty".into(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ToolError::InvalidMetadata {
                reason: format!("tool name `{name}` cannot contain whitespace"),
            });
        }

        Ok(Self {
            name,
            description: String::new(),
            capabilities: Vec::new(),
        })
    }

    /// Sets the description the reasoning strategy reads.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attaches capability identifiers required for invocation.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<CapabilityId>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the required capability identifiers.
    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityId] {
        &self.capabilities
    }
}

/// Trait implemented by tool executors: one string in, one string out.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with the given input text.
    async fn invoke(&self, input: &str) -> ToolResult<String>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(String) -> Fut,
    Fut: Future<Output = ToolResult<String>> + Send,
{
    async fn invoke(&self, input: &str) -> ToolResult<String> {
        (self)(input.to_owned()).await
    }
}

/// Handle returned by the registry for direct invocation.
#[derive(Clone)]
pub struct ToolHandle {
    metadata: ToolMetadata,
    executor: Arc<dyn Tool>,
}

impl std::fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandle")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ToolHandle {
    /// Returns the associated metadata.
    #[must_use]
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Executes the underlying tool implementation.
    ///
    /// # Errors
    ///
    /// Propagates whatever error the implementation returns.
    pub async fn invoke(&self, input: &str) -> ToolResult<String> {
        self.executor.invoke(input).await
    }
}

/// Registry of tools, kept in registration order.
///
/// Order matters: strategies list tools to the model in this order.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<Vec<ToolHandle>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .list()
            .into_iter()
            .map(|metadata| metadata.name)
            .collect();
        f.debug_struct("ToolRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool implementation.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register_tool<T>(&self, metadata: ToolMetadata, tool: T) -> ToolResult<()>
    where
        T: Tool + 'static,
    {
        let mut inner = self.inner.write().expect("tool registry poisoned");
        if inner
            .iter()
            .any(|handle| handle.metadata.name() == metadata.name())
        {
            return Err(ToolError::DuplicateTool {
                name: metadata.name().to_owned(),
            });
        }

        tracing::debug!(tool = metadata.name(), "tool registered");
        inner.push(ToolHandle {
            metadata,
            executor: Arc::new(tool),
        });

        Ok(())
    }

    /// Returns a handle to the tool matching the supplied name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolHandle> {
        let inner = self.inner.read().ok()?;
        inner
            .iter()
            .find(|handle| handle.metadata.name() == name)
            .cloned()
    }

    /// Invokes a registered tool directly.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the tool is not found or
    /// propagates the implementation's error.
    pub async fn invoke(&self, name: &str, input: &str) -> ToolResult<String> {
        let handle = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })?;
        handle.invoke(input).await
    }

    /// Lists the metadata of all registered tools in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn list(&self) -> Vec<ToolMetadata> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner
            .iter()
            .map(|handle| handle.metadata.clone())
            .collect()
    }

    /// Returns the number of registered tools.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("tool registry poisoned").len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool metadata failed validation.
    #[error("invalid tool metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Requested tool does not exist.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// The backing service call failed.
    #[error(transparent)]
    Service(#[from] AdapterError),

    /// Tool execution failed for another reason.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}
