//! Embedded script engine.
//!
//! Fetched scripts are Rhai. A script must define `main(event)` taking the
//! task descriptor as a map and returning a map, which becomes the handler
//! result.

use std::path::Path;

use anyhow::{anyhow, Result};
use rhai::{Dynamic, Engine, Scope};
use serde_json::Value;
use tracing::debug;

pub struct ScriptEngine {
    engine: Engine,
}

impl ScriptEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_expr_depths(256, 128);
        Self { engine }
    }

    /// Compile `path` and call its `main` function with the task
    /// descriptor.
    pub fn run_file(&self, path: &Path, event: &Value) -> Result<Value> {
        debug!(path = %path.display(), "running script");

        let ast = self
            .engine
            .compile_file(path.to_path_buf())
            .map_err(|e| anyhow!("failed to compile {}: {e}", path.display()))?;

        let arg: Dynamic = rhai::serde::to_dynamic(event)
            .map_err(|e| anyhow!("task descriptor is not scriptable: {e}"))?;

        let mut scope = Scope::new();
        let out = self
            .engine
            .call_fn::<Dynamic>(&mut scope, &ast, "main", (arg,))
            .map_err(|e| anyhow!("script {} failed: {e}", path.display()))?;

        let value: Value = rhai::serde::from_dynamic(&out)
            .map_err(|e| anyhow!("script result does not map to JSON: {e}"))?;
        if !value.is_object() {
            anyhow::bail!("script {} must return a map", path.display());
        }
        Ok(value)
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}
