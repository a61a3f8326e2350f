//! Tool descriptors and the registry agents pick tools from.
//!
//! A tool is a name, a natural-language description the reasoning strategy
//! reads to decide when it applies, and a string-to-string callable.
//! [`builtin`] provides the two service-backed tools, `fetch` and `playwright`.

#![warn(missing_docs, clippy::pedantic)]

pub mod builtin;
pub mod registry;
