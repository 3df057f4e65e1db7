//! Script retrieval and execution.
//!
//! A task descriptor may name a script instead of the built-in browser
//! task. The store resolves the name to a cached file (downloading it on
//! first use), and the engine runs the file's `main` function with the
//! descriptor.

pub mod engine;
pub mod store;

pub use engine::ScriptEngine;
pub use store::{ScriptStore, StoreError};
