//! toolbridge: a ReAct agent that reads local files and runs browser scripts
//! through two small HTTP services.
//!
//! The component crates are re-exported here; [`app`] wires them together
//! from an [`AgentConfig`](agent_config::AgentConfig).

#![warn(missing_docs, clippy::pedantic)]

pub mod app;

/// Capability identifiers and grants.
pub use agent_primitives as primitives;

/// Agent driver and reasoning strategies.
pub use agent_kernel as kernel;

/// Model and tool-service adapters.
pub use agent_adapters as adapters;

/// Tool registry and built-in tools.
pub use agent_tools as tools;

/// Tracing setup.
pub use agent_telemetry as telemetry;

/// Configuration loading.
pub use agent_config as config;
