//! Core shared types for toolbridge agents.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod error;
mod grant;

/// Capability identifiers attached to tools.
pub use capability::CapabilityId;
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Set of capabilities an agent is allowed to exercise.
pub use grant::CapabilityGrant;
