//! Configuration for toolbridge agents.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `TOOLBRIDGE_*` environment variables. The result is validated once, before
//! anything is constructed from it.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigResult, ENV_PREFIX, load};
pub use schema::{AgentConfig, AgentSettings, ModelConfig, ServicesConfig};
