//! Agent driver and reasoning strategies.
//!
//! The driver owns a tool list and hands it, together with a task, to an
//! injected [`AgentStrategy`]. The strategy decides which tools to call and
//! when, and produces the final answer. [`ReactStrategy`] is the stock
//! strategy: a zero-shot ReAct loop over a [`ModelAdapter`].
//!
//! [`ModelAdapter`]: agent_adapters::traits::ModelAdapter

#![warn(missing_docs, clippy::pedantic)]

mod driver;
mod error;
mod prompt;
mod react;
mod strategy;

pub use driver::AgentDriver;
pub use error::{KernelError, KernelResult};
pub use react::{ITERATION_LIMIT_ANSWER, ReactConfig, ReactStep, ReactStrategy, parse_react_output};
pub use strategy::{AgentStrategy, Toolbox};
