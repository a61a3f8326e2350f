//! Model and service adapters used by agents.
//!
//! [`openai`] talks to an OpenAI-compatible chat-completions endpoint behind the
//! shared [`traits::ModelAdapter`] interface. [`services`] is the tool side: it
//! turns the `fetch` and `run_script` tool calls into JSON-over-HTTP requests
//! against the file-fetch and browser-automation services.

#![warn(missing_docs, clippy::pedantic)]

pub mod openai;
pub mod services;
pub mod traits;

mod http_client;
