use agent_adapters::traits::AdapterError;
use agent_tools::registry::ToolError;
use thiserror::Error;

/// Result alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors that end an agent run.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The task text was empty or whitespace.
    #[error("agent task cannot be empty")]
    EmptyTask,

    /// A strategy asked for a tool that is not in the list.
    #[error("tool `{name}` is not available")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// The tool requires a capability the driver was not granted.
    #[error("tool `{tool}` requires capability `{capability}`, which has not been granted")]
    CapabilityDenied {
        /// Tool that was refused.
        tool: String,
        /// First missing capability.
        capability: String,
    },

    /// The tool ran and failed.
    #[error("tool `{name}` failed")]
    Tool {
        /// Tool that failed.
        name: String,
        /// Underlying tool error.
        #[source]
        source: ToolError,
    },

    /// The model adapter failed.
    #[error("model `{model}` failed")]
    Model {
        /// Model identifier.
        model: String,
        /// Underlying adapter error.
        #[source]
        source: AdapterError,
    },

    /// The model produced text the strategy cannot interpret.
    #[error("could not parse model output: {reason}: `{output}`")]
    UnparseableOutput {
        /// What was missing or contradictory.
        reason: String,
        /// Raw model output.
        output: String,
    },
}
